//! Signing key fixtures and subscriber token minting
//!
//! The PEM files live in `test-fixtures/keys/` and are only ever used to sign
//! and verify tokens inside tests.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use scribe_token::ScriptClaim;
use serde_json::{Map, Value, json};

pub const RSA_PRIVATE_PEM: &str = include_str!("../../../test-fixtures/keys/rsa_private.pem");
pub const RSA_PUBLIC_PEM: &str = include_str!("../../../test-fixtures/keys/rsa_public.pem");
/// RSA public key that does not match [`RSA_PRIVATE_PEM`]
pub const RSA_OTHER_PUBLIC_PEM: &str =
    include_str!("../../../test-fixtures/keys/rsa_other_public.pem");
pub const EC_PRIVATE_PEM: &str = include_str!("../../../test-fixtures/keys/ec_private.pem");
pub const EC_PUBLIC_PEM: &str = include_str!("../../../test-fixtures/keys/ec_public.pem");

/// Issuer written into minted tokens unless overridden
pub const TEST_ISSUER: &str = "scribe";

/// Builder for a subscriber token payload
///
/// Defaults to a token issued a minute ago that expires in an hour, with
/// timestamps encoded as digit strings the way the catalog emits them.
///
/// ```rust,no_run
/// use scribe_test_utils::TokenPayload;
///
/// let token = TokenPayload::new("subscriber-1").expired().sign_rs256();
/// ```
#[derive(Debug, Clone)]
pub struct TokenPayload {
    claims: Map<String, Value>,
}

impl TokenPayload {
    pub fn new(subject: &str) -> Self {
        let now = Utc::now();
        let mut claims = Map::new();
        claims.insert("sub".into(), json!(subject));
        claims.insert("iss".into(), json!(TEST_ISSUER));
        claims.insert("iat".into(), timestamp(now - Duration::minutes(1)));
        claims.insert("exp".into(), timestamp(now + Duration::hours(1)));
        claims.insert("claims".into(), json!("[]"));
        Self { claims }
    }

    /// Embed script claims as a serialized JSON document
    pub fn script_claims(mut self, claims: &[ScriptClaim]) -> Self {
        let serialized = serde_json::to_string(claims).unwrap();
        self.claims.insert("claims".into(), Value::String(serialized));
        self
    }

    pub fn issuer(self, issuer: &str) -> Self {
        self.set("iss", json!(issuer))
    }

    pub fn issued_at(self, at: DateTime<Utc>) -> Self {
        self.set("iat", timestamp(at))
    }

    pub fn expires_at(self, at: DateTime<Utc>) -> Self {
        self.set("exp", timestamp(at))
    }

    /// Expired one second ago
    pub fn expired(self) -> Self {
        self.expires_at(Utc::now() - Duration::seconds(1))
    }

    pub fn set(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.into(), value);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    pub fn sign_rs256(&self) -> String {
        self.sign_rs256_with(RSA_PRIVATE_PEM)
    }

    pub fn sign_rs256_with(&self, private_pem: &str) -> String {
        let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::RS256), &self.claims, &key).unwrap()
    }

    pub fn sign_es256(&self) -> String {
        let key = EncodingKey::from_ec_pem(EC_PRIVATE_PEM.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::ES256), &self.claims, &key).unwrap()
    }
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_token::{TokenValidator, VerificationKey};

    #[test]
    fn minted_token_validates() {
        let token = TokenPayload::new("subscriber-1").sign_rs256();
        let key = VerificationKey::from_pem(RSA_PUBLIC_PEM).unwrap();
        let decoded = TokenValidator::default().validate(&token, &key).unwrap();
        assert_eq!(decoded.subject(), "subscriber-1");
        assert!(decoded.script_claims().is_empty());
    }
}
