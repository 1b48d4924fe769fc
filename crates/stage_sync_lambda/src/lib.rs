//! AWS-oriented adapters and handlers for the staging-to-production sync.
//!
//! This crate owns runtime integration details (the Lambda handler, the object
//! storage and cache seams) and re-exports the domain crate as `runtime` so
//! binaries depend on a single module boundary.

pub mod adapters;
pub mod handlers;
pub mod trigger;

pub mod runtime {
    pub use stage_sync_core::{config, contract, decision, error};
}
