//! Reconciliation of a declared catalog tree against the remote catalog
//!
//! This module provides:
//! - **engine**: the [`Reconciler`] that walks provider, script groups and scripts
//! - **report**: the [`ReconcileReport`] describing every node decision

mod engine;
mod report;

pub use engine::{ReconcileOptions, Reconciler};
pub use report::{Action, AppliedAction, IdentityPath, Operation, ReconcileFailure, ReconcileReport};
