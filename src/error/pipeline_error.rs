use thiserror::Error;

use super::NodeError;
use crate::data::DatasetKind;
use crate::extent::Region;

/// Pipeline-level errors.
///
/// Wiring errors surface while building or immediately when an update is
/// issued against a malformed graph; negotiation errors abort the request
/// during phases 1–2 naming the offending node; computation errors wrap a
/// node's phase-3 failure without touching upstream caches.
#[derive(Debug, Error)]
pub enum PipelineError {
    // -- wiring --
    #[error("Node not found: {0}")]
    NodeNotFound(String),
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),
    #[error("Port {port} out of range on node {node}")]
    PortOutOfRange { node: String, port: usize },
    #[error("Required input port {port} on node {node} is not connected")]
    RequiredInputNotConnected { node: String, port: usize },
    #[error("Input port {port} on node {node} rejects {found:?} datasets")]
    InputKindRejected {
        node: String,
        port: usize,
        found: DatasetKind,
    },
    #[error("Input port {port} on node {node} accepts a single connection")]
    SingleInputReconnected { node: String, port: usize },
    #[error("Cycle detected in pipeline graph")]
    CycleDetected,

    // -- negotiation --
    #[error("Metadata negotiation failed at node {node}: {source}")]
    MetadataNegotiation { node: String, source: NodeError },
    #[error("Conflicting region requests for output port {port} of node {node}")]
    ConflictingRegion { node: String, port: usize },
    #[error("Requested region {requested:?} lies outside the whole region of node {node}")]
    RegionOutsideWhole { node: String, requested: Region },

    // -- computation --
    #[error("Computation failed at node {node}: {source}")]
    Compute { node: String, source: NodeError },

    #[error("Internal error: {0}")]
    Internal(String),
}
