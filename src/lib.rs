//! # XPipeline — A Demand-Driven Dataflow Execution Engine
//!
//! `xpipeline` schedules computation across a directed graph of processing
//! nodes operating on structured and composite datasets. Execution is
//! *pulled*: a downstream consumer requests a region of a node's output,
//! and the engine negotiates upstream exactly which piece of data every
//! node must supply before any computation runs. It supports:
//!
//! - **Three-phase requests**: capability/metadata exchange, region
//!   negotiation, and upstream-first computation with per-port caching.
//! - **Piece/extent streaming**: large datasets processed in bounded
//!   chunks through pluggable region translators, with ghost levels for
//!   stencil computations across piece boundaries.
//! - **Execution continuation**: a single logical request unfolding into
//!   multiple physical passes — one pass per time step, or one sub-pass
//!   per axis of a decomposed filter.
//! - **Composite fan-out**: nodes written for single datasets
//!   transparently process multi-block and leveled containers, with
//!   fill-only-empty merge semantics.
//! - **Cooperative cancellation**: an abort signal polled by computes and
//!   by the continuation loop, with partial results never cached.
//!
//! # Quick Start
//!
//! ```rust
//! use xpipeline::extent::Extent;
//! use xpipeline::nodes::{BoxSmooth, RampSource};
//! use xpipeline::PipelineBuilder;
//!
//! fn main() -> Result<(), xpipeline::PipelineError> {
//!     let mut builder = PipelineBuilder::new();
//!     builder.add_node("source", Box::new(RampSource::new(Extent::line(0, 99))))?;
//!     builder.add_node("smooth", Box::new(BoxSmooth::new(1)))?;
//!     builder.connect("source", 0, "smooth", 0)?;
//!     let mut pipeline = builder.build()?;
//!
//!     // Pull one piece of the smoothed output; only the matching input
//!     // region (plus the stencil radius) is requested upstream.
//!     let outcome = pipeline.update_piece("smooth", 0, 1, 4, 1)?;
//!     assert!(!outcome.is_cancelled());
//!     let _output = pipeline.output("smooth", 0)?;
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod error;
pub mod executive;
pub mod extent;
pub mod graph;
pub mod metadata;
pub mod node;
pub mod nodes;
pub mod signal;

pub use crate::data::{CompositeData, Dataset, DatasetKind, LeafPath, StructuredData, TableData};
pub use crate::error::{NodeError, NodeResult, PipelineError, PipelineResult};
pub use crate::executive::{
    Pipeline, PipelineEvent, UpdateOutcome, UpdateRequest, UpdateStatus,
};
pub use crate::extent::{BlockTranslator, DefaultTranslator, Extent, Region, RegionTranslator};
pub use crate::graph::{InputPort, OutputPort, PipelineBuilder, PortArity};
pub use crate::metadata::{MetaKey, MetaValue, MetadataRecord};
pub use crate::node::{ComputeContext, DescribeContext, NegotiateContext, PipelineNode};
pub use crate::signal::StopSignal;
