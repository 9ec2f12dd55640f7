//! Recast Processing Core
//!
//! Analyzes recorded interaction streams to generate editing decisions:
//! - **Auto-Zoom:** Cluster clicks, typing and focus changes into zoom segments
//!
//! This crate is pure computation: no I/O, no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod auto_zoom;

pub use auto_zoom::{build_auto_zooms, replace_auto_zooms, AutoZoomOptions, AutoZoomSignal};
