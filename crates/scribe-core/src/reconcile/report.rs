//! Outcome of a reconciliation pass

use std::fmt;

use scribe_types::EntityKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slash-separated identity path from the provider down to a node
///
/// `acme`, `acme/news`, `acme/news/daily_digest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct IdentityPath(Vec<String>);

impl IdentityPath {
    pub fn root(identity: impl Into<String>) -> Self {
        Self(vec![identity.into()])
    }

    pub fn child(&self, identity: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(identity.into());
        Self(segments)
    }

    /// Identity of the node itself
    pub fn leaf(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for IdentityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<IdentityPath> for String {
    fn from(path: IdentityPath) -> Self {
        path.to_string()
    }
}

impl From<String> for IdentityPath {
    fn from(path: String) -> Self {
        Self(path.split('/').map(str::to_string).collect())
    }
}

impl From<&str> for IdentityPath {
    fn from(path: &str) -> Self {
        Self::from(path.to_string())
    }
}

/// Gateway operation that was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Create,
    Update,
    Retire,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Retire => write!(f, "retire"),
        }
    }
}

/// What happened to one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Absent remotely, created
    Created,
    /// Fingerprint differed, full field set written
    Updated,
    /// Fingerprint matched, nothing written
    Unchanged,
    /// Remote-only node hidden with a visibility-off update
    Retired,
    /// Remote-only node that was already hidden
    AlreadyRetired,
    /// Declared sibling repeating an identity seen earlier
    SkippedDuplicate,
}

impl Action {
    /// Whether this action sends a write to the catalog
    pub fn is_write(self) -> bool {
        matches!(self, Action::Created | Action::Updated | Action::Retired)
    }
}

/// A single node decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAction {
    pub kind: EntityKind,
    pub path: IdentityPath,
    pub action: Action,
    /// Server id of the node; `None` for planned creates in a dry run and
    /// for skipped duplicates
    pub canonical_id: Option<Uuid>,
}

/// A failure scoped to one node and its subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileFailure {
    pub kind: EntityKind,
    pub path: IdentityPath,
    pub operation: Operation,
    pub message: String,
}

/// Report from a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Server id of the provider, once known
    pub provider_id: Option<Uuid>,
    /// Node decisions in traversal order
    pub actions: Vec<AppliedAction>,
    /// Subtrees that could not be reconciled
    pub failures: Vec<ReconcileFailure>,
    /// Whether writes were suppressed
    pub dry_run: bool,
}

impl ReconcileReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub(crate) fn record(
        &mut self,
        kind: EntityKind,
        path: IdentityPath,
        action: Action,
        canonical_id: Option<Uuid>,
    ) {
        self.actions.push(AppliedAction {
            kind,
            path,
            action,
            canonical_id,
        });
    }

    pub(crate) fn fail(
        &mut self,
        kind: EntityKind,
        path: IdentityPath,
        operation: Operation,
        message: impl Into<String>,
    ) {
        self.failures.push(ReconcileFailure {
            kind,
            path,
            operation,
            message: message.into(),
        });
    }

    fn with_action(&self, action: Action) -> impl Iterator<Item = &AppliedAction> {
        self.actions.iter().filter(move |a| a.action == action)
    }

    pub fn creates(&self) -> Vec<&AppliedAction> {
        self.with_action(Action::Created).collect()
    }

    pub fn updates(&self) -> Vec<&AppliedAction> {
        self.with_action(Action::Updated).collect()
    }

    pub fn retires(&self) -> Vec<&AppliedAction> {
        self.with_action(Action::Retired).collect()
    }

    pub fn unchanged(&self) -> Vec<&AppliedAction> {
        self.with_action(Action::Unchanged).collect()
    }

    pub fn skipped(&self) -> Vec<&AppliedAction> {
        self.with_action(Action::SkippedDuplicate).collect()
    }

    /// Number of writes sent, or planned in a dry run
    pub fn writes(&self) -> usize {
        self.actions.iter().filter(|a| a.action.is_write()).count()
    }

    /// True when every subtree reconciled
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Decision recorded for the node at `path`
    pub fn action_for(&self, path: &str) -> Option<&AppliedAction> {
        let path = IdentityPath::from(path);
        self.actions
            .iter()
            .find(|a| a.path == path && a.action != Action::SkippedDuplicate)
    }

    /// Server id resolved for the node at `path`
    pub fn resolved_id(&self, path: &str) -> Option<Uuid> {
        self.action_for(path).and_then(|a| a.canonical_id)
    }

    /// Render the report as pretty-printed JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn action(path: &str, action: Action) -> AppliedAction {
        let path = IdentityPath::from(path);
        AppliedAction {
            kind: match path.depth() {
                1 => EntityKind::Provider,
                2 => EntityKind::ScriptGroup,
                _ => EntityKind::Script,
            },
            path,
            action,
            canonical_id: Some(Uuid::nil()),
        }
    }

    #[test]
    fn test_identity_path_display() {
        let path = IdentityPath::root("acme").child("news").child("daily_digest");
        assert_eq!(path.to_string(), "acme/news/daily_digest");
        assert_eq!(path.leaf(), "daily_digest");
        assert_eq!(path.depth(), 3);
        assert_eq!(IdentityPath::from("acme/news/daily_digest"), path);
    }

    #[test]
    fn test_counts_and_success() {
        let mut report = ReconcileReport::new(false);
        report.actions = vec![
            action("acme", Action::Unchanged),
            action("acme/news", Action::Updated),
            action("acme/news/daily_digest", Action::Created),
            action("acme/old", Action::Retired),
            action("acme/older", Action::AlreadyRetired),
        ];

        assert_eq!(report.writes(), 3);
        assert_eq!(report.creates().len(), 1);
        assert_eq!(report.updates().len(), 1);
        assert_eq!(report.retires().len(), 1);
        assert_eq!(report.unchanged().len(), 1);
        assert!(report.is_success());

        report.fail(
            EntityKind::Script,
            IdentityPath::from("acme/news/x"),
            Operation::Create,
            "rejected",
        );
        assert!(!report.is_success());
    }

    #[test]
    fn test_resolved_id_ignores_skipped_duplicates() {
        let mut report = ReconcileReport::new(false);
        report.actions = vec![action("acme/news", Action::Created)];
        report.record(
            EntityKind::ScriptGroup,
            IdentityPath::from("acme/news"),
            Action::SkippedDuplicate,
            None,
        );
        assert_eq!(report.resolved_id("acme/news"), Some(Uuid::nil()));
        assert_eq!(report.resolved_id("acme/missing"), None);
    }

    #[test]
    fn test_report_serializes_paths_as_strings() {
        let mut report = ReconcileReport::new(true);
        report.actions = vec![action("acme/news", Action::Created)];
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["actions"][0]["path"], "acme/news");
        assert_eq!(json["actions"][0]["action"], "created");
        assert_eq!(json["actions"][0]["kind"], "script_group");
    }
}
