//! Boundary to the remote catalog service
//!
//! The [`Gateway`] trait is the only way the core talks to the catalog. It is
//! implemented outside this crate over whatever transport the caller uses;
//! authentication happens before a gateway is handed to the core.

mod types;

pub use types::{
    ProviderFields, ProviderKeys, ProviderPatch, ProviderSnapshot, ScriptFields,
    ScriptGroupFields, ScriptGroupPatch, ScriptGroupSnapshot, ScriptGroupSummary, ScriptPatch,
    ScriptSnapshot,
};

use scribe_types::Identity;
use uuid::Uuid;

/// Result type for gateway calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Failures reported by a gateway implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The catalog refused the credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The catalog answered with an error
    #[error("rejected by catalog: {0}")]
    Rejected(String),
}

/// Read, create and update operations on the remote catalog
///
/// Reads return `Ok(None)` when the node does not exist. Every call may
/// block on I/O. Nothing is ever hard-deleted through this trait; retiring a
/// node is an update that turns visibility off.
pub trait Gateway {
    /// Read the provider profile along with a summary of its script groups
    fn read_provider_profile(&self, provider: &Identity) -> GatewayResult<Option<ProviderSnapshot>>;

    fn create_provider(&self, fields: &ProviderFields) -> GatewayResult<Uuid>;

    fn update_provider(&self, provider: Uuid, patch: &ProviderPatch) -> GatewayResult<Uuid>;

    /// Read one script group along with its scripts
    fn read_script_group(
        &self,
        provider: Uuid,
        group: &Identity,
    ) -> GatewayResult<Option<ScriptGroupSnapshot>>;

    fn create_script_group(&self, provider: Uuid, fields: &ScriptGroupFields)
    -> GatewayResult<Uuid>;

    fn update_script_group(
        &self,
        provider: Uuid,
        group: Uuid,
        patch: &ScriptGroupPatch,
    ) -> GatewayResult<Uuid>;

    fn read_script(
        &self,
        provider: Uuid,
        group: Uuid,
        script: &Identity,
    ) -> GatewayResult<Option<ScriptSnapshot>>;

    fn create_script(&self, provider: Uuid, group: Uuid, fields: &ScriptFields)
    -> GatewayResult<Uuid>;

    fn update_script(
        &self,
        provider: Uuid,
        group: Uuid,
        script: Uuid,
        patch: &ScriptPatch,
    ) -> GatewayResult<Uuid>;

    /// Ask the catalog to mint a signed token for a subscriber
    fn issue_subscriber_token(&self, subscriber_id: &str) -> GatewayResult<String>;

    /// PEM-encoded public key that verifies subscriber tokens
    fn fetch_signing_public_key(&self) -> GatewayResult<String>;

    /// Rotate the provider's API key and secret key
    fn reset_provider_keys(&self, provider: Uuid) -> GatewayResult<ProviderKeys>;
}
