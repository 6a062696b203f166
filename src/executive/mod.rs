//! The executive: orchestrates the three-phase request protocol.
//!
//! A [`Pipeline`] owns the wired graph, the per-node state arena, the
//! logical stamp counter and the abort signal. Each call to
//! [`Pipeline::update`] (or its streaming variants) runs one demand-driven
//! request against a target port:
//!
//! 1. *metadata* — `describe_output` runs upstream-first for every node
//!    whose cached capability records are stale;
//! 2. *region negotiation* — starting at the target, each node states what
//!    its inputs must supply, producing one concrete region per edge;
//! 3. *computation* — `compute` runs upstream-first, served from per-port
//!    caches wherever the request is already covered.
//!
//! Phases 2–3 repeat while any node leaves its continue flag set. The
//! public mutation surface takes `&mut self`, which serializes concurrent
//! requests against the same node by construction.

pub mod event;
mod phases;
pub mod request;

pub use event::{PipelineEvent, UpdateOutcome, UpdateStatus};
pub use request::UpdateRequest;

use std::sync::Arc;

use tracing::debug_span;
use uuid::Uuid;

use crate::data::Dataset;
use crate::error::{PipelineError, PipelineResult};
use crate::graph::types::PipelineGraph;
use crate::metadata::MetadataRecord;
use crate::node::NodeState;
use crate::signal::StopSignal;
use phases::Executive;
use request::RequestContext;

/// An executable, wired dataflow pipeline.
pub struct Pipeline {
    graph: PipelineGraph,
    states: Vec<NodeState>,
    counter: u64,
    signal: StopSignal,
}

impl Pipeline {
    pub(crate) fn from_graph(graph: PipelineGraph) -> Self {
        // The builder never removes nodes, so indices are dense and the
        // state arena can be a plain vector addressed by index.
        let mut states = Vec::with_capacity(graph.graph.node_count());
        let mut counter = 0;
        for idx in graph.graph.node_indices() {
            debug_assert_eq!(idx.index(), states.len());
            let mut state = NodeState::new(graph.num_output_ports(idx));
            // Every node starts modified so the first request runs phase 1.
            counter += 1;
            state.modified = counter;
            states.push(state);
        }
        Self {
            graph,
            states,
            counter,
            signal: StopSignal::new(),
        }
    }

    pub fn graph(&self) -> &PipelineGraph {
        &self.graph
    }

    /// The cooperative abort signal observed by computes and by the
    /// continuation loop. Trigger it from another thread (or a callback)
    /// to stop the in-flight update early; call
    /// [`StopSignal::reset`] before the next update.
    pub fn stop_signal(&self) -> StopSignal {
        self.signal.clone()
    }

    /// Request the whole output of `node`'s `port`.
    pub fn update(&mut self, node: &str, port: usize) -> PipelineResult<UpdateOutcome> {
        self.update_request(node, port, UpdateRequest::whole())
    }

    /// Request one piece of `node`'s `port`, for streaming callers.
    pub fn update_piece(
        &mut self,
        node: &str,
        port: usize,
        piece: u32,
        num_pieces: u32,
        ghost_level: u32,
    ) -> PipelineResult<UpdateOutcome> {
        self.update_request(node, port, UpdateRequest::piece(piece, num_pieces, ghost_level))
    }

    /// Run one fully parameterized update request.
    pub fn update_request(
        &mut self,
        node: &str,
        port: usize,
        request: UpdateRequest,
    ) -> PipelineResult<UpdateOutcome> {
        let target = self.graph.node_index(node)?;
        if port >= self.graph.num_output_ports(target) {
            return Err(PipelineError::PortOutOfRange {
                node: node.to_string(),
                port,
            });
        }

        let request_id = Uuid::new_v4();
        let span = debug_span!("update", request = %request_id, node, port);
        let _enter = span.enter();

        let mut executive = Executive {
            graph: &self.graph,
            states: &mut self.states,
            counter: &mut self.counter,
            signal: self.signal.clone(),
            ctx: RequestContext::new(),
        };
        executive.run(target, port, &request)
    }

    /// Cached output of `(node, port)` from the last completed request.
    pub fn output(&self, node: &str, port: usize) -> PipelineResult<Option<Arc<Dataset>>> {
        let idx = self.graph.node_index(node)?;
        self.states[idx.index()]
            .output_data
            .get(port)
            .cloned()
            .ok_or_else(|| PipelineError::PortOutOfRange {
                node: node.to_string(),
                port,
            })
    }

    /// Cached capability metadata of `(node, port)`.
    pub fn output_metadata(&self, node: &str, port: usize) -> PipelineResult<&MetadataRecord> {
        let idx = self.graph.node_index(node)?;
        self.states[idx.index()]
            .output_meta
            .get(port)
            .ok_or_else(|| PipelineError::PortOutOfRange {
                node: node.to_string(),
                port,
            })
    }

    /// Advance `node`'s modification stamp, invalidating its cached
    /// metadata and data and that of everything downstream of it.
    pub fn mark_modified(&mut self, node: &str) -> PipelineResult<()> {
        let idx = self.graph.node_index(node)?;
        self.counter += 1;
        self.states[idx.index()].modified = self.counter;
        Ok(())
    }
}
