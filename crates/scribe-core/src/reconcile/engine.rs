//! Reconciler implementation
//!
//! Walks a declared provider tree top-down and brings the remote catalog in
//! line with it. Each node is matched to its remote counterpart by identity,
//! compared by fingerprint and then created, updated or left alone. Remote
//! nodes that are no longer declared are retired by turning visibility off.

use std::collections::HashSet;

use scribe_meta::{DuplicatePolicy, ProviderSpec, ScriptGroupSpec, ScriptSpec, SyncSettings};
use scribe_types::EntityKind;
use uuid::Uuid;

use crate::gateway::{
    Gateway, GatewayError, ProviderFields, ProviderPatch, ScriptFields, ScriptGroupFields,
    ScriptGroupPatch, ScriptGroupSummary, ScriptPatch, ScriptSnapshot,
};
use crate::schema::{PROVIDER_SCHEMA, SCRIPT_GROUP_SCHEMA, SCRIPT_SCHEMA};
use crate::{Error, Result};

use super::report::{Action, IdentityPath, Operation, ReconcileReport};

/// Options for a reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Read the remote tree and report planned actions without writing
    pub dry_run: bool,
    /// Treatment of siblings that repeat an identity
    pub duplicate_policy: DuplicatePolicy,
}

impl From<&SyncSettings> for ReconcileOptions {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            dry_run: settings.dry_run.unwrap_or(false),
            duplicate_policy: settings.duplicate_policy.unwrap_or_default(),
        }
    }
}

/// A failed gateway call, tagged with the node it was made for
struct NodeError {
    kind: EntityKind,
    path: IdentityPath,
    operation: Operation,
    source: GatewayError,
}

impl NodeError {
    fn at(
        kind: EntityKind,
        path: &IdentityPath,
        operation: Operation,
    ) -> impl FnOnce(GatewayError) -> NodeError {
        let path = path.clone();
        move |source| NodeError {
            kind,
            path,
            operation,
            source,
        }
    }

    fn record(self, report: &mut ReconcileReport) {
        tracing::warn!(
            kind = %self.kind,
            identity = %self.path,
            operation = %self.operation,
            error = %self.source,
            "Reconciliation failed for subtree"
        );
        report.fail(self.kind, self.path, self.operation, self.source.to_string());
    }
}

impl From<NodeError> for Error {
    fn from(e: NodeError) -> Self {
        Error::Gateway {
            kind: e.kind,
            path: e.path,
            operation: e.operation,
            source: e.source,
        }
    }
}

/// Drives a declared tree into the remote catalog through a [`Gateway`]
///
/// Provider-level failures abort the pass. A failure on a script group
/// aborts that group's subtree only; failures on scripts and retirements are
/// recorded and their siblings still run. Nothing is retried.
pub struct Reconciler<'g, G: Gateway + ?Sized> {
    gateway: &'g G,
    options: ReconcileOptions,
}

impl<'g, G: Gateway + ?Sized> Reconciler<'g, G> {
    pub fn new(gateway: &'g G) -> Self {
        Self::with_options(gateway, ReconcileOptions::default())
    }

    pub fn with_options(gateway: &'g G, options: ReconcileOptions) -> Self {
        Self { gateway, options }
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    /// Reconcile one provider tree
    ///
    /// The declared tree is not modified; resolved server ids are returned
    /// in the report.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateIdentity` before any gateway call when the tree
    /// repeats an identity and the policy is `Reject`, and `Gateway` when
    /// reading or writing the provider itself fails.
    pub fn reconcile(&self, provider: &ProviderSpec) -> Result<ReconcileReport> {
        if self.options.duplicate_policy == DuplicatePolicy::Reject
            && let Some(dup) = scribe_meta::find_duplicates(provider).into_iter().next()
        {
            return Err(Error::DuplicateIdentity {
                kind: dup.kind,
                identity: dup.identity,
                parent: dup.parent,
            });
        }

        let mut report = ReconcileReport::new(self.options.dry_run);
        let path = IdentityPath::root(provider.alt_id.as_str());
        let kind = EntityKind::Provider;

        tracing::info!(
            identity = %provider.alt_id,
            dry_run = self.options.dry_run,
            "Reconciling provider"
        );

        let remote = self
            .gateway
            .read_provider_profile(&provider.alt_id)
            .map_err(NodeError::at(kind, &path, Operation::Read))?;

        let fields = ProviderFields::from(provider);
        let local = PROVIDER_SCHEMA.compute(&fields);

        let (provider_id, remote_groups) = match remote {
            None => {
                let id = if self.options.dry_run {
                    None
                } else {
                    Some(
                        self.gateway
                            .create_provider(&fields)
                            .map_err(NodeError::at(kind, &path, Operation::Create))?,
                    )
                };
                self.record(&mut report, kind, path.clone(), Action::Created, id);
                (id, Vec::new())
            }
            Some(snapshot) if local.matches(&snapshot.version) => {
                self.record(&mut report, kind, path.clone(), Action::Unchanged, Some(snapshot.id));
                (Some(snapshot.id), snapshot.script_groups)
            }
            Some(snapshot) => {
                let id = if self.options.dry_run {
                    snapshot.id
                } else {
                    self.gateway
                        .update_provider(snapshot.id, &ProviderPatch::from(&fields))
                        .map_err(NodeError::at(kind, &path, Operation::Update))?
                };
                self.record(&mut report, kind, path.clone(), Action::Updated, Some(id));
                (Some(id), snapshot.script_groups)
            }
        };
        report.provider_id = provider_id;

        let mut seen = HashSet::new();
        for group in &provider.script_groups {
            let group_path = path.child(group.alt_id.as_str());
            if !seen.insert(group.alt_id.as_str()) {
                self.record(
                    &mut report,
                    EntityKind::ScriptGroup,
                    group_path,
                    Action::SkippedDuplicate,
                    None,
                );
                continue;
            }

            if let Err(e) = self.reconcile_group(provider_id, group, &group_path, &mut report) {
                e.record(&mut report);
            }
        }

        if let Some(provider_id) = provider_id {
            for remote_group in remote_groups
                .iter()
                .filter(|g| !seen.contains(g.alt_id.as_str()))
            {
                self.retire_group(provider_id, remote_group, &path, &mut report);
            }
        }

        tracing::info!(
            identity = %provider.alt_id,
            writes = report.writes(),
            failures = report.failures.len(),
            "Reconciled provider"
        );

        Ok(report)
    }

    fn reconcile_group(
        &self,
        provider_id: Option<Uuid>,
        group: &ScriptGroupSpec,
        path: &IdentityPath,
        report: &mut ReconcileReport,
    ) -> std::result::Result<(), NodeError> {
        let kind = EntityKind::ScriptGroup;

        // A provider that is only planned has no remote children yet
        let remote = match provider_id {
            Some(provider_id) => self
                .gateway
                .read_script_group(provider_id, &group.alt_id)
                .map_err(NodeError::at(kind, path, Operation::Read))?,
            None => None,
        };

        let fields = ScriptGroupFields::from(group);
        let local = SCRIPT_GROUP_SCHEMA.compute(&fields);

        let (group_id, remote_scripts) = match remote {
            None => {
                let id = match self.writable(provider_id) {
                    Some(provider_id) => Some(
                        self.gateway
                            .create_script_group(provider_id, &fields)
                            .map_err(NodeError::at(kind, path, Operation::Create))?,
                    ),
                    None => None,
                };
                self.record(report, kind, path.clone(), Action::Created, id);
                (id, Vec::new())
            }
            Some(snapshot) if local.matches(&snapshot.version) => {
                self.record(report, kind, path.clone(), Action::Unchanged, Some(snapshot.id));
                (Some(snapshot.id), snapshot.scripts)
            }
            Some(snapshot) => {
                let id = match self.writable(provider_id) {
                    Some(provider_id) => self
                        .gateway
                        .update_script_group(
                            provider_id,
                            snapshot.id,
                            &ScriptGroupPatch::from(&fields),
                        )
                        .map_err(NodeError::at(kind, path, Operation::Update))?,
                    None => snapshot.id,
                };
                self.record(report, kind, path.clone(), Action::Updated, Some(id));
                (Some(id), snapshot.scripts)
            }
        };

        let mut seen = HashSet::new();
        for script in &group.scripts {
            let script_path = path.child(script.alt_id.as_str());
            if !seen.insert(script.alt_id.as_str()) {
                self.record(
                    report,
                    EntityKind::Script,
                    script_path,
                    Action::SkippedDuplicate,
                    None,
                );
                continue;
            }

            if let Err(e) = self.reconcile_script(
                provider_id,
                group_id,
                &remote_scripts,
                script,
                &script_path,
                report,
            ) {
                e.record(report);
            }
        }

        if let (Some(provider_id), Some(group_id)) = (provider_id, group_id) {
            for remote_script in remote_scripts
                .iter()
                .filter(|s| !seen.contains(s.alt_id.as_str()))
            {
                self.retire_script(provider_id, group_id, remote_script, path, report);
            }
        }

        Ok(())
    }

    fn reconcile_script(
        &self,
        provider_id: Option<Uuid>,
        group_id: Option<Uuid>,
        remote_scripts: &[ScriptSnapshot],
        script: &ScriptSpec,
        path: &IdentityPath,
        report: &mut ReconcileReport,
    ) -> std::result::Result<(), NodeError> {
        let kind = EntityKind::Script;
        let fields = ScriptFields::from(script);
        let local = SCRIPT_SCHEMA.compute(&fields);
        let parents = self.writable(provider_id).zip(group_id);

        match remote_scripts.iter().find(|s| script.alt_id == *s.alt_id) {
            None => {
                let id = match parents {
                    Some((provider_id, group_id)) => Some(
                        self.gateway
                            .create_script(provider_id, group_id, &fields)
                            .map_err(NodeError::at(kind, path, Operation::Create))?,
                    ),
                    None => None,
                };
                self.record(report, kind, path.clone(), Action::Created, id);
            }
            Some(snapshot) if local.matches(&snapshot.version) => {
                self.record(report, kind, path.clone(), Action::Unchanged, Some(snapshot.id));
            }
            Some(snapshot) => {
                let id = match parents {
                    Some((provider_id, group_id)) => self
                        .gateway
                        .update_script(
                            provider_id,
                            group_id,
                            snapshot.id,
                            &ScriptPatch::from(&fields),
                        )
                        .map_err(NodeError::at(kind, path, Operation::Update))?,
                    None => snapshot.id,
                };
                self.record(report, kind, path.clone(), Action::Updated, Some(id));
            }
        }

        Ok(())
    }

    fn retire_group(
        &self,
        provider_id: Uuid,
        remote: &ScriptGroupSummary,
        parent: &IdentityPath,
        report: &mut ReconcileReport,
    ) {
        let kind = EntityKind::ScriptGroup;
        let path = parent.child(remote.alt_id.as_str());

        if !remote.public {
            self.record(report, kind, path, Action::AlreadyRetired, Some(remote.id));
            return;
        }
        if self.options.dry_run {
            self.record(report, kind, path, Action::Retired, Some(remote.id));
            return;
        }

        match self.gateway.update_script_group(
            provider_id,
            remote.id,
            &ScriptGroupPatch::visibility(false),
        ) {
            Ok(id) => self.record(report, kind, path, Action::Retired, Some(id)),
            Err(e) => NodeError::at(kind, &path, Operation::Retire)(e).record(report),
        }
    }

    fn retire_script(
        &self,
        provider_id: Uuid,
        group_id: Uuid,
        remote: &ScriptSnapshot,
        parent: &IdentityPath,
        report: &mut ReconcileReport,
    ) {
        let kind = EntityKind::Script;
        let path = parent.child(remote.alt_id.as_str());

        if !remote.public {
            self.record(report, kind, path, Action::AlreadyRetired, Some(remote.id));
            return;
        }
        if self.options.dry_run {
            self.record(report, kind, path, Action::Retired, Some(remote.id));
            return;
        }

        match self.gateway.update_script(
            provider_id,
            group_id,
            remote.id,
            &ScriptPatch::visibility(false),
        ) {
            Ok(id) => self.record(report, kind, path, Action::Retired, Some(id)),
            Err(e) => NodeError::at(kind, &path, Operation::Retire)(e).record(report),
        }
    }

    /// Parent id to write under, or `None` when writes are suppressed
    fn writable(&self, parent: Option<Uuid>) -> Option<Uuid> {
        parent.filter(|_| !self.options.dry_run)
    }

    fn record(
        &self,
        report: &mut ReconcileReport,
        kind: EntityKind,
        path: IdentityPath,
        action: Action,
        canonical_id: Option<Uuid>,
    ) {
        match action {
            Action::Unchanged | Action::AlreadyRetired => {
                tracing::debug!(
                    kind = %kind,
                    identity = %path,
                    canonical_id = ?canonical_id,
                    ?action,
                    "No change"
                );
            }
            Action::SkippedDuplicate => {
                tracing::warn!(kind = %kind, identity = %path, "Skipping duplicate identity");
            }
            Action::Created | Action::Updated | Action::Retired => {
                tracing::info!(
                    kind = %kind,
                    identity = %path,
                    canonical_id = ?canonical_id,
                    ?action,
                    dry_run = self.options.dry_run,
                    "Applied"
                );
            }
        }
        report.record(kind, path, action, canonical_id);
    }
}
