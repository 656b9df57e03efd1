//! Structural validation of a declared tree

use std::collections::HashSet;

use scribe_types::EntityKind;

use crate::Error;
use crate::manifest::ProviderSpec;

/// A sibling that repeats an identity already seen at the same level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub kind: EntityKind,
    /// The repeated identity
    pub identity: String,
    /// Slash-separated identity path of the parent node
    pub parent: String,
}

impl Duplicate {
    pub fn into_error(self) -> Error {
        Error::DuplicateIdentity {
            kind: self.kind,
            identity: self.identity,
            parent: self.parent,
        }
    }
}

/// Collect every repeated identity in the tree, in traversal order.
///
/// Only the second and later occurrences are reported. Scripts under a
/// duplicated group are not inspected, since that group would be skipped.
pub fn find_duplicates(provider: &ProviderSpec) -> Vec<Duplicate> {
    let mut duplicates = Vec::new();
    let mut groups_seen = HashSet::new();

    for group in &provider.script_groups {
        if !groups_seen.insert(group.alt_id.as_str()) {
            duplicates.push(Duplicate {
                kind: EntityKind::ScriptGroup,
                identity: group.alt_id.to_string(),
                parent: provider.alt_id.to_string(),
            });
            continue;
        }

        let mut scripts_seen = HashSet::new();
        for script in &group.scripts {
            if !scripts_seen.insert(script.alt_id.as_str()) {
                duplicates.push(Duplicate {
                    kind: EntityKind::Script,
                    identity: script.alt_id.to_string(),
                    parent: format!("{}/{}", provider.alt_id, group.alt_id),
                });
            }
        }
    }

    duplicates
}
