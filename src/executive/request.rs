use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;

use super::event::PipelineEvent;
use crate::extent::Region;
use crate::metadata::MetadataRecord;

/// Parameters of a top-level update request.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    /// Region to request of the target port; `None` means the whole
    /// dataset (piece 0 of 1, ghost level 0).
    pub region: Option<Region>,
    /// Time value the request targets.
    pub time_value: Option<f64>,
    /// Crop the returned structured output to the requested extent.
    pub exact: bool,
}

impl UpdateRequest {
    pub fn whole() -> Self {
        Self::default()
    }

    pub fn piece(piece: u32, num_pieces: u32, ghost_level: u32) -> Self {
        Self {
            region: Some(Region::Pieces {
                piece,
                num_pieces,
                ghost_level,
            }),
            ..Self::default()
        }
    }

    pub fn region(region: Region) -> Self {
        Self {
            region: Some(region),
            ..Self::default()
        }
    }

    pub fn with_time(mut self, time_value: f64) -> Self {
        self.time_value = Some(time_value);
        self
    }

    pub fn with_exact(mut self) -> Self {
        self.exact = true;
        self
    }
}

/// State scoped to a single update request and discarded with it.
///
/// Request-scoped metadata records live here, never on node state; the
/// per-pass maps are cleared at every continuation pass while the event
/// log and memoized pipeline stamps span the whole request.
#[derive(Default)]
pub(crate) struct RequestContext {
    /// Request record assigned to each `(node, output port)` this pass.
    pub requests: HashMap<(NodeIndex, usize), MetadataRecord>,
    /// Nodes already executed this pass.
    pub executed: HashSet<NodeIndex>,
    /// Nodes that must re-run this pass: every node whose previous pass
    /// left the continue flag set, plus everything downstream of them.
    pub continuing: HashSet<NodeIndex>,
    /// Memoized pipeline stamps (max of own and ancestor modifications).
    pub mtime: HashMap<NodeIndex, u64>,
    pub events: Vec<PipelineEvent>,
    pub aborted: bool,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-pass state, keeping the event log, memoized stamps,
    /// and the carried-over continuation set.
    pub fn begin_pass(&mut self) {
        self.requests.clear();
        self.executed.clear();
    }
}
