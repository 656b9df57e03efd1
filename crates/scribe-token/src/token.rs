//! Decoded subscriber token

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::ScriptClaim;

/// A fully validated subscriber token
///
/// Only produced by [`TokenValidator`](crate::TokenValidator); every field is
/// populated and the value is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriberToken {
    subject: String,
    issuer: String,
    issued_at: DateTime<Utc>,
    expiration: DateTime<Utc>,
    script_claims: Vec<ScriptClaim>,
}

impl SubscriberToken {
    pub(crate) fn new(
        subject: String,
        issuer: String,
        issued_at: DateTime<Utc>,
        expiration: DateTime<Utc>,
        script_claims: Vec<ScriptClaim>,
    ) -> Self {
        Self {
            subject,
            issuer,
            issued_at,
            expiration,
            script_claims,
        }
    }

    /// Subscriber id
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    pub fn script_claims(&self) -> &[ScriptClaim] {
        &self.script_claims
    }

    /// Whether the token entitles its subject to the given script
    pub fn grants_script(&self, script: Uuid) -> bool {
        self.script_claims.iter().any(|c| c.script_uuid == script)
    }

    /// Claims for the script with the given group and script slugs
    pub fn claims_for(&self, group_alt_id: &str, script_alt_id: &str) -> Vec<&ScriptClaim> {
        self.script_claims
            .iter()
            .filter(|c| c.script_group_alt_id == group_alt_id && c.script_alt_id == script_alt_id)
            .collect()
    }
}
