//! Shared test utilities for the Scribe catalog sync workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`gateway`]: [`MemoryGateway`], an in-memory catalog that records calls
//! - [`keys`]: signing key fixtures and a [`TokenPayload`] builder
//! - [`project`]: [`TestProject`] builder for manifest and settings files
//! - [`logging`]: tracing subscriber setup for tests

pub mod gateway;
pub mod keys;
pub mod logging;
pub mod project;

pub use gateway::{Call, CallKind, MemoryGateway};
pub use keys::TokenPayload;
pub use project::{TestProject, fixture_manifest, fixture_path};
