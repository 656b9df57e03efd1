//! Subscriber token validation
//!
//! A subscriber token is a signed JWT minted by the catalog service for one
//! subscriber. Its outer envelope carries `sub`, `iss`, `iat` and `exp`; an
//! embedded `claims` document lists the scripts the subscriber may use.
//!
//! Validation runs as a sequence of hard gates (signature, claim presence,
//! expiry, issued-at, embedded claims) and stops at the first failure. See
//! [`TokenValidator`].

pub mod claims;
pub mod error;
pub mod key;
pub mod token;
pub mod validator;

pub use claims::ScriptClaim;
pub use error::{Result, TokenError};
pub use key::{SigningKeyCache, VerificationKey};
pub use token::SubscriberToken;
pub use validator::TokenValidator;
