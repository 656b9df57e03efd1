//! Settings resolution with layered merge
//!
//! The `SettingsResolver` loads client settings from several sources, with
//! later sources overriding earlier ones:
//!
//! 1. Global settings (`<config_dir>/scribe/settings.toml`)
//! 2. Project settings (`<root>/.scribe/settings.toml`)
//! 3. Environment variables (`MYSCRIBAE_*`)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scribe_meta::{DuplicatePolicy, Settings};

use crate::{Error, Result};

pub const ENV_API_URL: &str = "MYSCRIBAE_API_URL";
pub const ENV_API_KEY: &str = "MYSCRIBAE_API_KEY";
pub const ENV_SECRET_KEY: &str = "MYSCRIBAE_SECRET_KEY";
pub const ENV_API_TOKEN: &str = "MYSCRIBAE_API_TOKEN";
pub const ENV_DUPLICATE_POLICY: &str = "MYSCRIBAE_DUPLICATE_POLICY";

/// Resolves client settings by merging global, project and environment layers
pub struct SettingsResolver {
    /// Project root containing `.scribe/`
    root: PathBuf,

    /// Override for the global config directory (used for testing)
    global_config_dir_override: Option<PathBuf>,

    /// Fixed environment used instead of the process environment
    env_override: Option<HashMap<String, String>>,
}

impl SettingsResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: None,
            env_override: None,
        }
    }

    /// Use a custom global config directory instead of the platform one
    pub fn with_global_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.global_config_dir_override = Some(dir.into());
        self
    }

    /// Read environment layers from `env` instead of the process environment
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env_override = Some(env);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.global_config_dir_override {
            return Some(dir.clone());
        }
        dirs::config_dir().map(|d| d.join("scribe"))
    }

    fn env_var(&self, name: &str) -> Option<String> {
        let value = match &self.env_override {
            Some(env) => env.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Resolve the effective settings
    ///
    /// Missing files are skipped. A malformed file or an unknown duplicate
    /// policy in the environment is an error.
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(global_dir) = self.global_config_dir() {
            let path = global_dir.join("settings.toml");
            if path.is_file() {
                tracing::debug!(?path, "Loading global settings");
                settings.merge(&Settings::load(&path)?);
            } else {
                tracing::debug!(?path, "No global settings found, skipping");
            }
        }

        let path = self.root.join(".scribe").join("settings.toml");
        if path.is_file() {
            tracing::debug!(?path, "Loading project settings");
            settings.merge(&Settings::load(&path)?);
        }

        settings.merge(&self.env_layer()?);

        Ok(settings)
    }

    fn env_layer(&self) -> Result<Settings> {
        let mut layer = Settings::default();
        layer.api.url = self.env_var(ENV_API_URL);
        layer.api.api_key = self.env_var(ENV_API_KEY);
        layer.api.secret_key = self.env_var(ENV_SECRET_KEY);
        layer.api.api_token = self.env_var(ENV_API_TOKEN);
        layer.sync.duplicate_policy = self
            .env_var(ENV_DUPLICATE_POLICY)
            .map(|v| v.parse::<DuplicatePolicy>())
            .transpose()?;
        Ok(layer)
    }
}

/// Connection details a gateway implementation needs
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_url: String,
    pub api_key: String,
    pub secret_key: String,
    /// Pre-issued bearer token, when the caller already has one
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl Credentials {
    /// Extract credentials from resolved settings
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` naming the first absent value among the
    /// API url, API key and secret key.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        fn required(value: &Option<String>, name: &'static str) -> Result<String> {
            value
                .clone()
                .ok_or(Error::MissingCredential { name })
        }

        Ok(Self {
            api_url: required(&settings.api.url, "api url")?,
            api_key: required(&settings.api.api_key, "api key")?,
            secret_key: required(&settings.api.secret_key, "secret key")?,
            api_token: settings.api.api_token.clone(),
            timeout: Duration::from_secs(settings.api.timeout_secs()),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
