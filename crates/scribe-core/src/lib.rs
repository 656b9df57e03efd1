//! Core orchestration layer for Scribe catalog sync
//!
//! This crate sits above the value, manifest and token crates and provides:
//!
//! - **Gateway**: the boundary trait to the remote catalog service
//! - **Fingerprint schemas**: the ordered field lists behind drift detection
//! - **Reconciler**: top-down create, update and retire of a provider tree
//! - **Settings resolution**: global, project and environment layers
//! - **CatalogClient**: a facade over all of the above plus subscriber tokens
//!
//! ```text
//!               CatalogClient
//!                     |
//!     +---------------+---------------+
//!     |               |               |
//! Reconciler    SettingsResolver  scribe-token
//!     |
//!  Gateway
//! ```

pub mod client;
pub mod error;
pub mod gateway;
pub mod reconcile;
pub mod schema;
pub mod settings;

pub use client::CatalogClient;
pub use error::{Error, Result};
pub use gateway::{
    Gateway, GatewayError, GatewayResult, ProviderFields, ProviderKeys, ProviderPatch,
    ProviderSnapshot, ScriptFields, ScriptGroupFields, ScriptGroupPatch, ScriptGroupSnapshot,
    ScriptGroupSummary, ScriptPatch, ScriptSnapshot,
};
pub use reconcile::{
    Action, AppliedAction, IdentityPath, Operation, ReconcileFailure, ReconcileOptions,
    ReconcileReport, Reconciler,
};
pub use schema::{FingerprintSchema, PROVIDER_SCHEMA, SCRIPT_GROUP_SCHEMA, SCRIPT_SCHEMA};
pub use settings::{Credentials, SettingsResolver};
