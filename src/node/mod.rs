//! The node contract: one trait, three callbacks.
//!
//! Every unit of computation implements [`PipelineNode`]. The executive
//! drives the callbacks in a fixed order per request — `describe_output`
//! (phase 1), `describe_needed_input` (phase 2), `compute` (phase 3) — and
//! hands each one a context view scoped to exactly the state that phase
//! owns. Defaults supply pass-through behavior so concrete nodes override
//! only what they change.

pub mod context;
pub mod state;

pub use context::{ComputeContext, DescribeContext, NegotiateContext};
pub use state::NodeState;

use crate::data::DatasetKind;
use crate::error::NodeResult;
use crate::graph::port::{InputPort, OutputPort};

/// A unit of computation with N input ports and M output ports.
///
/// Implementations are plain objects; all mutable per-node state (pass
/// counter, scratch dataset, caches) lives in the executive's state arena
/// and is exposed through the compute context. Received input datasets are
/// read-only views and must never be mutated in place.
pub trait PipelineNode: Send + Sync {
    /// Input port declarations. Defaults to no inputs (a source node).
    fn input_ports(&self) -> Vec<InputPort> {
        Vec::new()
    }

    /// Output port declarations. Defaults to a single port of unspecified
    /// kind.
    fn output_ports(&self) -> Vec<OutputPort> {
        vec![OutputPort::of(DatasetKind::Any)]
    }

    /// Phase 1: derive output capability metadata from upstream capability
    /// metadata. Must not touch data. The default forwards the first
    /// connected input's capabilities to every output port.
    fn describe_output(&self, ctx: &mut DescribeContext<'_>) -> NodeResult<()> {
        ctx.forward_capabilities();
        Ok(())
    }

    /// Phase 2: given the region requested of this node's output, state
    /// what each input connection must supply. The default requests the
    /// same region from every input, dilating extents by the request's
    /// ghost level.
    fn describe_needed_input(&self, ctx: &mut NegotiateContext<'_>) -> NodeResult<()> {
        ctx.pass_through()
    }

    /// Phase 3: produce output datasets for the assigned region. May set
    /// the continue flag via [`ComputeContext::set_continue`] to request
    /// another phase 2–3 pass before the request completes.
    fn compute(&self, ctx: &mut ComputeContext<'_>) -> NodeResult<()>;
}
