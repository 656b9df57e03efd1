//! Claim schemas carried by a subscriber token
//!
//! The outer [`Envelope`] is decoded first, straight from the JWT payload.
//! Its `claims` member is a serialized sub-document that is only decoded into
//! [`ScriptClaim`]s after the envelope has passed every temporal check.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::TokenError;

/// One entitlement: a subscription to a specific script in a script group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptClaim {
    pub subscription_uuid: Uuid,
    pub script_group_uuid: Uuid,
    pub script_group_alt_id: String,
    pub script_uuid: Uuid,
    pub script_alt_id: String,
}

/// Outer JWT payload, before any semantic checks
///
/// Every member is optional so that presence can be checked in a fixed order
/// with a specific error per claim.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub sub: Option<Value>,
    #[serde(default)]
    pub exp: Option<Value>,
    #[serde(default)]
    pub iss: Option<Value>,
    #[serde(default)]
    pub iat: Option<Value>,
    #[serde(default)]
    pub claims: Option<Value>,
}

/// Text of a claim, or `None` when it is absent, null or empty.
///
/// Numbers are accepted and rendered in decimal since timestamps may arrive
/// either as JSON integers or as digit strings.
pub(crate) fn claim_text(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether the embedded claims document is present at all
pub(crate) fn has_script_claims(value: &Option<Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Decode the embedded claims document.
///
/// Accepts the serialized form (a JSON string holding an array) as well as an
/// inline array.
pub(crate) fn decode_script_claims(value: &Value) -> Result<Vec<ScriptClaim>, TokenError> {
    let decoded = match value {
        Value::String(raw) => serde_json::from_str(raw),
        Value::Array(_) => serde_json::from_value(value.clone()),
        other => {
            return Err(TokenError::ClaimsDecodeError(format!(
                "expected a claims array, found {}",
                json_type(other)
            )));
        }
    };
    decoded.map_err(|e| TokenError::ClaimsDecodeError(e.to_string()))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
