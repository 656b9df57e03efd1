//! Subscriber token validation gates

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, Validation, decode};
use scribe_meta::{TokenAlgorithm, TokenSettings};

use crate::claims::{Envelope, claim_text, decode_script_claims, has_script_claims};
use crate::{Result, SubscriberToken, TokenError, VerificationKey};

/// Validates subscriber tokens against a signing public key
///
/// Gates run in this order and the first failure wins:
///
/// 1. signature and structure (`InvalidToken`)
/// 2. presence of `sub`, `exp`, `iss`, `iat` and `claims`
/// 3. `exp` is an integer timestamp strictly after now
/// 4. `iat` is an integer timestamp not after now
/// 5. the embedded claims document decodes
/// 6. optional issuer pinning
#[derive(Debug, Clone)]
pub struct TokenValidator {
    algorithm: Algorithm,
    expected_issuer: Option<String>,
}

impl Default for TokenValidator {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::RS256,
            expected_issuer: None,
        }
    }
}

impl TokenValidator {
    pub fn new(algorithm: TokenAlgorithm) -> Self {
        Self {
            algorithm: jwt_algorithm(algorithm),
            expected_issuer: None,
        }
    }

    pub fn from_settings(settings: &TokenSettings) -> Self {
        Self {
            algorithm: jwt_algorithm(settings.algorithm.unwrap_or_default()),
            expected_issuer: settings.expected_issuer.clone(),
        }
    }

    /// Reject tokens whose issuer differs from `issuer`
    pub fn with_expected_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.expected_issuer = Some(issuer.into());
        self
    }

    /// Validate `token` against the current time
    pub fn validate(&self, token: &str, key: &VerificationKey) -> Result<SubscriberToken> {
        self.validate_at(token, key, Utc::now())
    }

    /// Validate `token` as if the current time were `now`
    pub fn validate_at(
        &self,
        token: &str,
        key: &VerificationKey,
        now: DateTime<Utc>,
    ) -> Result<SubscriberToken> {
        let envelope = self.verify_signature(token, key)?;

        let subject = claim_text(&envelope.sub).ok_or(TokenError::MissingSubject)?;
        let exp = claim_text(&envelope.exp).ok_or(TokenError::MissingExpiration)?;
        let issuer = claim_text(&envelope.iss).ok_or(TokenError::MissingIssuer)?;
        let iat = claim_text(&envelope.iat).ok_or(TokenError::MissingIssuedAt)?;
        let claims = match &envelope.claims {
            Some(value) if has_script_claims(&envelope.claims) => value,
            _ => return Err(TokenError::MissingClaims),
        };

        tracing::debug!(
            sub = %subject,
            iss = %issuer,
            exp = %exp,
            iat = %iat,
            "Validating subscriber token"
        );

        let expiration =
            parse_timestamp(&exp).ok_or_else(|| TokenError::InvalidExpiration(exp.clone()))?;
        if expiration <= now {
            return Err(TokenError::ExpiredToken);
        }

        let issued_at =
            parse_timestamp(&iat).ok_or_else(|| TokenError::InvalidIssuedAt(iat.clone()))?;
        if issued_at > now {
            return Err(TokenError::TokenNotYetEffective);
        }

        let script_claims = decode_script_claims(claims).inspect_err(|e| {
            tracing::debug!(error = %e, "Failed to decode script claims");
        })?;

        if let Some(expected) = &self.expected_issuer
            && *expected != issuer
        {
            return Err(TokenError::UnexpectedIssuer {
                expected: expected.clone(),
                actual: issuer,
            });
        }

        Ok(SubscriberToken::new(
            subject,
            issuer,
            issued_at,
            expiration,
            script_claims,
        ))
    }

    /// Check the signature and decode the outer payload.
    ///
    /// The library's own temporal and required-claim checks are disabled so
    /// that the ordered gates above decide every semantic failure.
    fn verify_signature(&self, token: &str, key: &VerificationKey) -> Result<Envelope> {
        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        decode::<Envelope>(token, key.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::InvalidToken(e.to_string()))
    }
}

fn jwt_algorithm(algorithm: TokenAlgorithm) -> Algorithm {
    match algorithm {
        TokenAlgorithm::Rs256 => Algorithm::RS256,
        TokenAlgorithm::Es256 => Algorithm::ES256,
    }
}

/// Parse integer Unix seconds
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = raw.parse().ok()?;
    DateTime::from_timestamp(secs, 0)
}
