//! Signing public keys and the caller-owned key cache

use std::fmt;

use jsonwebtoken::DecodingKey;

use crate::{Result, TokenError};

/// Key family of a parsed public key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    EllipticCurve,
}

/// A parsed public key used to verify subscriber token signatures
#[derive(Clone)]
pub struct VerificationKey {
    key: DecodingKey,
    family: KeyFamily,
}

impl VerificationKey {
    /// Parse a PEM-encoded RSA or EC public key.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyParse`] when the PEM holds neither.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let bytes = pem.trim().as_bytes();

        if let Ok(key) = DecodingKey::from_rsa_pem(bytes) {
            return Ok(Self {
                key,
                family: KeyFamily::Rsa,
            });
        }

        match DecodingKey::from_ec_pem(bytes) {
            Ok(key) => Ok(Self {
                key,
                family: KeyFamily::EllipticCurve,
            }),
            Err(e) => Err(TokenError::KeyParse(e.to_string())),
        }
    }

    pub fn family(&self) -> KeyFamily {
        self.family
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

/// Holds the catalog service's signing key after the first fetch
///
/// The cache is a plain value owned by the caller; mutation needs `&mut self`,
/// so sharing it across threads requires the caller's own synchronization.
#[derive(Debug, Default)]
pub struct SigningKeyCache {
    key: Option<VerificationKey>,
}

impl SigningKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with an already parsed key
    pub fn with_key(key: VerificationKey) -> Self {
        Self { key: Some(key) }
    }

    /// Return the cached key, fetching and parsing it on first use.
    ///
    /// `fetch` must return the PEM-encoded public key. A fetch or parse
    /// failure leaves the cache empty so the next call tries again.
    pub fn get_or_fetch<F, E>(&mut self, fetch: F) -> std::result::Result<&VerificationKey, E>
    where
        F: FnOnce() -> std::result::Result<String, E>,
        E: From<TokenError>,
    {
        let key = match self.key.take() {
            Some(key) => key,
            None => {
                let pem = fetch()?;
                let key = VerificationKey::from_pem(&pem)?;
                tracing::debug!(family = ?key.family(), "Cached signing public key");
                key
            }
        };

        Ok(self.key.insert(key))
    }

    pub fn cached(&self) -> Option<&VerificationKey> {
        self.key.as_ref()
    }

    /// Drop the cached key, forcing the next lookup to fetch again
    pub fn invalidate(&mut self) {
        if self.key.take().is_some() {
            tracing::debug!("Invalidated cached signing public key");
        }
    }
}
