//! Entity identity: canonical id or human-assigned slug
//!
//! An [`Identity`] is the key used to match a locally declared node to its
//! remote counterpart. It is either the server's canonical id (a UUID in the
//! hyphenated 36-character form) or a lower snake case slug such as
//! `weekly_digest`. Input is never normalized: the original text is kept and
//! returned verbatim by `Display`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+(_[a-z]+)*$").unwrap());

/// Length of the hyphenated UUID rendering
const CANONICAL_LEN: usize = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Repr {
    Canonical(Uuid),
    Slug,
}

/// Identifier for a provider, script group or script
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity {
    raw: String,
    repr: Repr,
}

impl Identity {
    /// Parse a canonical id or slug.
    ///
    /// The canonical form is tried first; anything that is not a hyphenated
    /// UUID must match `^[a-z]+(_[a-z]+)*$`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentity`] when the string is neither.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() == CANONICAL_LEN
            && let Ok(uuid) = Uuid::try_parse(raw)
        {
            return Ok(Self {
                raw: raw.to_string(),
                repr: Repr::Canonical(uuid),
            });
        }

        if is_slug(raw) {
            return Ok(Self {
                raw: raw.to_string(),
                repr: Repr::Slug,
            });
        }

        Err(Error::InvalidIdentity {
            value: raw.to_string(),
        })
    }

    /// Identity for a server-assigned id, rendered in canonical form.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            raw: uuid.hyphenated().to_string(),
            repr: Repr::Canonical(uuid),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self.repr, Repr::Canonical(_))
    }

    pub fn is_slug(&self) -> bool {
        matches!(self.repr, Repr::Slug)
    }

    /// The parsed UUID when this identity is canonical.
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self.repr {
            Repr::Canonical(uuid) => Some(uuid),
            Repr::Slug => None,
        }
    }
}

/// Check whether `s` is a lower snake case slug.
pub fn is_slug(s: &str) -> bool {
    SLUG_PATTERN.is_match(s)
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.raw
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl PartialEq<str> for Identity {
    fn eq(&self, other: &str) -> bool {
        self.raw == other
    }
}
