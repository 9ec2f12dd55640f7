//! Recast Project Model
//!
//! Defines the core data contracts for Recast projects:
//! - **Events:** Timestamped interaction events (click, typing, focus, cursor)
//! - **Timeline:** Editing decisions (zoom, speed, cut, mask, highlight segments,
//!   background, cursor, audio, export settings)
//! - **Viewport:** The clamped-centering view transform shared by preview and export
//! - **Project:** Top-level metadata and timeline persistence
//!
//! All positions are normalized to `[0.0, 1.0]` relative to the captured
//! frame so they survive resolution changes between capture and export.

pub mod event;
pub mod project;
pub mod timeline;
pub mod viewport;

pub use event::*;
pub use project::*;
pub use timeline::*;
pub use viewport::*;
