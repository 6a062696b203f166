//! Error types for the pipeline engine.
//!
//! - [`NodeError`] — Errors raised inside individual node callbacks.
//! - [`PipelineError`] — Top-level errors for pipeline building and update
//!   requests, grouped by the taxonomy wiring / negotiation / computation.

pub mod node_error;
pub mod pipeline_error;

pub use node_error::NodeError;
pub use pipeline_error::PipelineError;

/// Convenience alias for pipeline-level results.
pub type PipelineResult<T> = Result<T, PipelineError>;
/// Convenience alias for node-level results.
pub type NodeResult<T> = Result<T, NodeError>;
