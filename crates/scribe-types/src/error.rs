//! Error types for scribe-types

/// Result type for scribe-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Validation errors raised while constructing value types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(
        "invalid alt id or uuid. expecting format like (12345678-1234-1234-1234-123456789abc) or (my_alt_id). received: {value}"
    )]
    InvalidIdentity { value: String },

    #[error("invalid money value {value:?}: {reason}")]
    InvalidMoney { value: String, reason: String },

    #[error(
        "invalid recurrence. expecting one of (daily, weekly, monthly, yearly). received: {value}"
    )]
    InvalidRecurrence { value: String },
}

impl Error {
    pub(crate) fn money(value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMoney {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
