//! Entity kinds in the provider catalog tree

use std::fmt;

use serde::{Deserialize, Serialize};

/// The level of a node in the provider → script group → script tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Provider,
    ScriptGroup,
    Script,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Provider => write!(f, "provider"),
            EntityKind::ScriptGroup => write!(f, "script group"),
            EntityKind::Script => write!(f, "script"),
        }
    }
}
