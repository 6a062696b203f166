//! Pipeline graph: port declarations, node/edge storage, builder.

pub mod builder;
pub mod port;
pub mod types;

pub use builder::PipelineBuilder;
pub use port::{InputPort, OutputPort, PortArity};
pub use types::{Endpoint, GraphEdge, GraphNode, NodeIndexMap, PipelineGraph};
