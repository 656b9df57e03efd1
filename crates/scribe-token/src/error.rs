//! Error types for scribe-token

pub type Result<T> = std::result::Result<T, TokenError>;

/// Reasons a subscriber token is refused
///
/// Every failure is returned to the caller; no partially valid token is ever
/// produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid subscriber token: {0}")]
    InvalidToken(String),

    #[error("missing subject")]
    MissingSubject,

    #[error("missing expiration")]
    MissingExpiration,

    #[error("invalid expiration: {0:?}")]
    InvalidExpiration(String),

    #[error("expired token")]
    ExpiredToken,

    #[error("missing issuer")]
    MissingIssuer,

    #[error("missing issued at")]
    MissingIssuedAt,

    #[error("invalid issued at: {0:?}")]
    InvalidIssuedAt(String),

    #[error("token not yet effective")]
    TokenNotYetEffective,

    #[error("token missing claims")]
    MissingClaims,

    #[error("failed to decode script claims: {0}")]
    ClaimsDecodeError(String),

    #[error("unexpected issuer {actual:?}, expected {expected:?}")]
    UnexpectedIssuer { expected: String, actual: String },

    #[error("failed to parse signing public key: {0}")]
    KeyParse(String),
}
