//! Error types for scribe-core

use scribe_types::EntityKind;

use crate::gateway::GatewayError;
use crate::reconcile::{IdentityPath, Operation};

/// Result type for scribe-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in scribe-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A gateway call failed while reconciling a node
    #[error("Failed to {operation} {kind} {path}: {source}")]
    Gateway {
        kind: EntityKind,
        path: IdentityPath,
        operation: Operation,
        #[source]
        source: GatewayError,
    },

    /// A gateway call outside the catalog tree failed
    #[error("Catalog request '{request}' failed: {source}")]
    Remote {
        request: &'static str,
        #[source]
        source: GatewayError,
    },

    /// Two siblings in the declared tree share an identity
    #[error("Duplicate {kind} identity '{identity}' under {parent}")]
    DuplicateIdentity {
        kind: EntityKind,
        identity: String,
        parent: String,
    },

    /// A required connection setting is missing
    #[error("Missing credential: {name}")]
    MissingCredential { name: &'static str },

    // Transparent wrappers for underlying crate errors
    /// Value error from scribe-types
    #[error(transparent)]
    Types(#[from] scribe_types::Error),

    /// Manifest or settings error from scribe-meta
    #[error(transparent)]
    Meta(#[from] scribe_meta::Error),

    /// Token error from scribe-token
    #[error(transparent)]
    Token(#[from] scribe_token::TokenError),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn remote(request: &'static str, source: GatewayError) -> Self {
        Error::Remote { request, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_error_displays_context() {
        let error = Error::Gateway {
            kind: EntityKind::ScriptGroup,
            path: IdentityPath::root("acme").child("news"),
            operation: Operation::Create,
            source: GatewayError::Rejected("boom".to_string()),
        };
        let display = error.to_string();
        assert!(display.contains("create"), "got: {display}");
        assert!(display.contains("script group"), "got: {display}");
        assert!(display.contains("acme/news"), "got: {display}");
        assert!(display.contains("boom"), "got: {display}");
    }

    #[test]
    fn json_error_converts() {
        let source = serde_json::from_str::<u32>("not json").unwrap_err();
        let error: Error = source.into();
        assert!(matches!(error, Error::Json(_)));
    }
}
