//! Content fingerprints for drift detection
//!
//! A fingerprint is the MD5 hex digest of a node's significant field values,
//! null fields dropped and the rest joined with [`SEPARATOR`]. The remote
//! catalog stores the same digest as a node's `version`, so the two can be
//! compared directly. Fingerprints are opaque and never parsed.

use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Separator placed between non-null field values before digesting
pub const SEPARATOR: char = ',';

/// Opaque content digest of a node's significant fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a remote `version` string.
    pub fn matches(&self, version: &str) -> bool {
        self.0 == version
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the fingerprint of an ordered list of optional field values.
///
/// `None` entries contribute nothing (not even a separator). The result is
/// order-dependent; callers must supply fields in a fixed order.
pub fn fingerprint<S: AsRef<str>>(fields: &[Option<S>]) -> Fingerprint {
    let mut joined = String::new();
    for (i, value) in fields.iter().flatten().enumerate() {
        if i > 0 {
            joined.push(SEPARATOR);
        }
        joined.push_str(value.as_ref());
    }

    let mut hasher = Md5::new();
    hasher.update(joined.as_bytes());
    Fingerprint(format!("{:x}", hasher.finalize()))
}
