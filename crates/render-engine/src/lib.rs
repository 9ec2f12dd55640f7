//! Recast Render Engine
//!
//! Compiles an edit timeline into a single transcoder invocation and
//! runs it, falling back across encoders until one produces output.
//!
//! # Pipeline Architecture
//!
//! ```text
//! timeline ──► zoom expressions ──► filter graph ──┐
//!                                                  ├── render plan (per encoder)
//! -encoders query ──► pick ──► attempt chain ──────┘         │
//!                                                            ▼
//!                                          transcoder ──► output.mp4
//!                                              │
//!                                              └── stderr ──► progress / diagnostics
//! ```

pub mod encoder;
pub mod executor;
pub mod export;
pub mod expr;
pub mod filter_graph;
pub mod plan;
pub mod progress;

pub use encoder::{
    build_encoder_attempts, pick_encoder, query_available_encoders, EncoderChoice,
};
pub use executor::{render_with_fallback, run_render, FailedAttempt, RenderSuccess};
pub use export::{export_timeline, ExportJob, RenderOutcome};
pub use filter_graph::{compile_filter_graph, create_filter_graph, FilterGraph};
pub use plan::{create_render_plan, RenderPlan, RenderPlanOptions};
pub use progress::{ExportProgress, ExportStage};
