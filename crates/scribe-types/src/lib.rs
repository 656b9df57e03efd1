//! Value types for Scribe catalog sync
//!
//! Leaf types shared by every other crate in the workspace:
//!
//! - [`Identity`]: canonical id or slug used to join local and remote nodes
//! - [`Fingerprint`]: opaque content digest used for drift detection
//! - [`MoneyValue`], [`Recurrence`], [`Count`]: validated field values

pub mod count;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod kind;
pub mod money;
pub mod recurrence;

pub use count::Count;
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, fingerprint};
pub use identity::Identity;
pub use kind::EntityKind;
pub use money::MoneyValue;
pub use recurrence::Recurrence;
