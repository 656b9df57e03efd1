//! Client settings file format
//!
//! A settings file configures how the client reaches the catalog service,
//! how reconciliation behaves and how subscriber tokens are checked.
//! Several files can be layered with [`Settings::merge`]; values set in the
//! overlay win.
//!
//! ```toml
//! [api]
//! url = "https://api.example.com/graphql"
//! api_key = "..."
//! timeout_secs = 5
//!
//! [sync]
//! duplicate_policy = "reject"
//! dry_run = false
//!
//! [tokens]
//! algorithm = "RS256"
//! expected_issuer = "scribe"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::manifest::read_config_file;
use crate::{Error, Result};

/// Default transport timeout for gateway requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Complete client settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub tokens: TokenSettings,
}

/// Connection and credential settings for the catalog service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ApiSettings {
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

/// How reconciliation treats siblings that repeat an identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail the pass before any write
    #[default]
    Reject,
    /// First occurrence wins; later ones are skipped and reported
    Skip,
}

impl FromStr for DuplicatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(DuplicatePolicy::Reject),
            "skip" => Ok(DuplicatePolicy::Skip),
            _ => Err(Error::InvalidConfig {
                path: Default::default(),
                message: format!("unknown duplicate policy: {s}"),
            }),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Reject => write!(f, "reject"),
            DuplicatePolicy::Skip => write!(f, "skip"),
        }
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_policy: Option<DuplicatePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

/// Signature algorithm expected on subscriber tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenAlgorithm {
    #[default]
    #[serde(rename = "RS256")]
    Rs256,
    #[serde(rename = "ES256")]
    Es256,
}

/// Subscriber token validation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<TokenAlgorithm>,
    /// When set, tokens from any other issuer are rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_issuer: Option<String>,
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Load a settings file
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_config_file(path)?;
        Self::parse(&content).map_err(|e| match e {
            Error::TomlDe(e) => Error::InvalidConfig {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
            other => other,
        })
    }

    /// Merge another settings layer into this one
    ///
    /// Every value present in `other` replaces the value in `self`; absent
    /// values leave `self` untouched.
    pub fn merge(&mut self, other: &Settings) {
        fn overlay<T: Clone>(base: &mut Option<T>, other: &Option<T>) {
            if other.is_some() {
                *base = other.clone();
            }
        }

        overlay(&mut self.api.url, &other.api.url);
        overlay(&mut self.api.api_key, &other.api.api_key);
        overlay(&mut self.api.secret_key, &other.api.secret_key);
        overlay(&mut self.api.api_token, &other.api.api_token);
        overlay(&mut self.api.timeout_secs, &other.api.timeout_secs);

        overlay(&mut self.sync.duplicate_policy, &other.sync.duplicate_policy);
        overlay(&mut self.sync.dry_run, &other.sync.dry_run);

        overlay(&mut self.tokens.algorithm, &other.tokens.algorithm);
        overlay(&mut self.tokens.expected_issuer, &other.tokens.expected_issuer);
    }
}
