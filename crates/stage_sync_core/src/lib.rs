//! Staging-to-production sync domain primitives.
//!
//! This crate owns the promotion decision, configuration, cache record
//! encoding, and the error taxonomy. It intentionally excludes AWS SDK, Redis,
//! and Lambda runtime concerns.

pub mod config;
pub mod contract;
pub mod decision;
pub mod error;
