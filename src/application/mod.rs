//! Application module - pipeline orchestration
//!
//! Wires the domain types and infrastructure seams into the two-stage run:
//! discover signatures, then fetch-and-merge.

pub mod batch;
pub mod pipeline;

pub use batch::fetch_all;
pub use pipeline::{run_pipeline, PipelineError, PipelineOutcome};
