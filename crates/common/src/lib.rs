//! Recast Common Utilities
//!
//! Shared infrastructure for all Recast crates:
//! - Error types and result aliases
//! - Tracing/logging initialization
//! - Configuration loading and transcoder discovery

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
