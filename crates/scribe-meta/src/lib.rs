//! Declared catalog tree and client settings for Scribe catalog sync.
//!
//! This crate provides the caller's desired state (a [`Manifest`] holding a
//! provider, its script groups and their scripts) plus the [`Settings`]
//! file format used to configure the client.

pub mod error;
pub mod manifest;
pub mod settings;
pub mod validation;

pub use error::{Error, Result};
pub use manifest::{Manifest, ProviderSpec, ScriptGroupSpec, ScriptSpec};
pub use settings::{
    ApiSettings, DuplicatePolicy, Settings, SyncSettings, TokenAlgorithm, TokenSettings,
};
pub use validation::{Duplicate, find_duplicates};
