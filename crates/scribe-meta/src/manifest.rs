//! Declared catalog tree parsed from a TOML manifest
//!
//! The manifest is the caller's desired state. It is never mutated by
//! reconciliation; resolved server ids come back in the reconcile report.
//!
//! ```toml
//! [provider]
//! alt_id = "acme"
//! name = "Acme"
//! description = "Acme scripts"
//! public = true
//!
//! [[provider.script_groups]]
//! alt_id = "news"
//! name = "News"
//! description = "Daily news scripts"
//!
//! [[provider.script_groups.scripts]]
//! alt_id = "daily_digest"
//! name = "Daily digest"
//! description = "One summary a day"
//! recurrence = "monthly"
//! price = "4.99"
//! sla_sec = 3600
//! token_lifetime_sec = 86400
//! ```

use std::fs;
use std::path::Path;

use scribe_types::{Count, Identity, MoneyValue, Recurrence};
use serde::{Deserialize, Serialize};

use crate::validation::find_duplicates;
use crate::{Error, Result};

/// Largest manifest or settings file accepted, in bytes
pub const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

fn default_version() -> String {
    "1".to_string()
}

fn default_public() -> bool {
    true
}

/// Root of a declared catalog tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest schema version
    #[serde(default = "default_version")]
    pub version: String,

    pub provider: ProviderSpec,
}

/// Declared provider profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub alt_id: Identity,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub account_service: bool,
    #[serde(default)]
    pub script_groups: Vec<ScriptGroupSpec>,
}

/// Declared script group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptGroupSpec {
    pub alt_id: Identity,
    pub name: String,
    pub description: String,
    #[serde(default = "default_public")]
    pub public: bool,
    #[serde(default)]
    pub scripts: Vec<ScriptSpec>,
}

/// Declared script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSpec {
    pub alt_id: Identity,
    pub name: String,
    pub description: String,
    pub recurrence: Recurrence,
    /// Price; integers are cents, strings follow [`MoneyValue::parse`]
    pub price: MoneyValue,
    /// Service-level agreement in seconds
    pub sla_sec: Count,
    /// Lifetime of subscriber tokens for this script, in seconds
    pub token_lifetime_sec: Count,
    #[serde(default = "default_public")]
    pub public: bool,
}

impl Manifest {
    /// Parse a manifest from TOML content
    ///
    /// Only the shape is checked here; call [`Manifest::validate`] for the
    /// sibling uniqueness rules.
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        Ok(manifest)
    }

    /// Load, parse and validate a manifest file
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the file is missing, `ConfigTooLarge` if it
    /// exceeds [`MAX_CONFIG_SIZE`], `InvalidConfig` for malformed TOML and
    /// `DuplicateIdentity` if two siblings share an identity.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_config_file(path)?;
        let manifest = Self::parse(&content).map_err(|e| match e {
            Error::TomlDe(e) => Error::InvalidConfig {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
            other => other,
        })?;
        manifest.validate()?;
        tracing::debug!(
            path = %path.display(),
            provider = %manifest.provider.alt_id,
            groups = manifest.provider.script_groups.len(),
            "Loaded manifest"
        );
        Ok(manifest)
    }

    /// Check that identities are unique among siblings at every level
    pub fn validate(&self) -> Result<()> {
        match find_duplicates(&self.provider).into_iter().next() {
            Some(dup) => Err(dup.into_error()),
            None => Ok(()),
        }
    }
}

impl ProviderSpec {
    /// Find a declared script group by identity
    pub fn script_group(&self, alt_id: &str) -> Option<&ScriptGroupSpec> {
        self.script_groups.iter().find(|g| g.alt_id == *alt_id)
    }
}

impl ScriptGroupSpec {
    /// Find a declared script by identity
    pub fn script(&self, alt_id: &str) -> Option<&ScriptSpec> {
        self.scripts.iter().find(|s| s.alt_id == *alt_id)
    }
}

/// Read a config file, refusing anything larger than [`MAX_CONFIG_SIZE`]
pub(crate) fn read_config_file(path: &Path) -> Result<String> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(Error::io(path, e)),
    };

    if metadata.len() > MAX_CONFIG_SIZE {
        return Err(Error::ConfigTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max: MAX_CONFIG_SIZE,
        });
    }

    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}
