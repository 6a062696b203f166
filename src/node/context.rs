//! Per-phase context views handed to node callbacks.
//!
//! Each context exposes exactly the state the phase owns: phase 1 reads
//! upstream capabilities and writes own capabilities, phase 2 reads the
//! assigned request and writes input requests, phase 3 reads inputs and
//! writes outputs. Anything else is unreachable by construction.

use std::sync::Arc;

use crate::data::Dataset;
use crate::error::{NodeError, NodeResult};
use crate::extent::{Extent, Region};
use crate::metadata::{MetaKey, MetadataRecord};
use crate::signal::StopSignal;

/// Capability keys forwarded by the default `describe_output`.
const FORWARDED: [MetaKey; 4] = [
    MetaKey::WholeRegion,
    MetaKey::TimeValues,
    MetaKey::TimeRange,
    MetaKey::RegionTranslator,
];

/// Phase 1 view: upstream capability records in, own capability records
/// out.
pub struct DescribeContext<'a> {
    pub(crate) upstream: &'a [Vec<MetadataRecord>],
    pub(crate) outputs: &'a mut [MetadataRecord],
}

impl<'a> DescribeContext<'a> {
    pub fn num_input_ports(&self) -> usize {
        self.upstream.len()
    }

    pub fn num_connections(&self, port: usize) -> usize {
        self.upstream.get(port).map_or(0, |c| c.len())
    }

    pub fn num_output_ports(&self) -> usize {
        self.outputs.len()
    }

    pub fn upstream(&self, port: usize, connection: usize) -> Option<&MetadataRecord> {
        self.upstream.get(port)?.get(connection)
    }

    /// First connection of the first input port, the conventional source of
    /// forwarded capabilities.
    pub fn first_upstream(&self) -> Option<&MetadataRecord> {
        self.upstream(0, 0)
    }

    pub fn output_mut(&mut self, port: usize) -> &mut MetadataRecord {
        &mut self.outputs[port]
    }

    /// Default phase 1 behavior: forward `WholeRegion`, `TimeValues`,
    /// `TimeRange` and `RegionTranslator` from the first connected input to
    /// every output port.
    pub fn forward_capabilities(&mut self) {
        let Some(first) = self.upstream.first().and_then(|c| c.first()) else {
            return;
        };
        let first = first.clone();
        for output in self.outputs.iter_mut() {
            for key in FORWARDED {
                output.forward(&first, key);
            }
        }
    }
}

/// Phase 2 view: the request assigned to this node's output, own and
/// upstream capability records, and the input request records to fill in.
pub struct NegotiateContext<'a> {
    pub(crate) request: &'a MetadataRecord,
    pub(crate) outputs: &'a [MetadataRecord],
    pub(crate) upstream: &'a [Vec<MetadataRecord>],
    pub(crate) input_requests: &'a mut [Vec<MetadataRecord>],
    pub(crate) pass_index: u32,
}

impl<'a> NegotiateContext<'a> {
    /// The request-scoped record assigned to this node's output port.
    pub fn request(&self) -> &MetadataRecord {
        self.request
    }

    pub fn output(&self, port: usize) -> &MetadataRecord {
        &self.outputs[port]
    }

    pub fn num_input_ports(&self) -> usize {
        self.input_requests.len()
    }

    pub fn num_connections(&self, port: usize) -> usize {
        self.input_requests.get(port).map_or(0, |c| c.len())
    }

    pub fn upstream(&self, port: usize, connection: usize) -> Option<&MetadataRecord> {
        self.upstream.get(port)?.get(connection)
    }

    /// Continuation pass counter, for nodes that pick per-pass upstream
    /// requests (e.g. one time value per pass).
    pub fn pass_index(&self) -> u32 {
        self.pass_index
    }

    pub fn requested_region(&self) -> NodeResult<Region> {
        self.request.require_region(MetaKey::UpdateRegion)
    }

    pub fn ghost_level(&self) -> u32 {
        match self.request.integer(MetaKey::UpdateGhostLevels) {
            Ok(Some(g)) => g.max(0) as u32,
            _ => 0,
        }
    }

    pub fn input_request_mut(&mut self, port: usize, connection: usize) -> &mut MetadataRecord {
        &mut self.input_requests[port][connection]
    }

    pub fn set_input_region(&mut self, port: usize, connection: usize, region: Region) {
        self.input_requests[port][connection].set(MetaKey::UpdateRegion, region);
    }

    /// Default phase 2 behavior: request the region assigned to this node
    /// from every input connection. Extent requests are dilated by the
    /// request's ghost level and clamped to the upstream whole extent when
    /// one is known; piece requests pass through untouched. Ghost levels
    /// therefore accumulate additively across hops. Streaming and time
    /// keys are forwarded alongside.
    pub fn pass_through(&mut self) -> NodeResult<()> {
        let region = self.requested_region()?;
        let ghost = self.ghost_level();

        for port in 0..self.input_requests.len() {
            for connection in 0..self.input_requests[port].len() {
                let upstream_whole = self
                    .upstream
                    .get(port)
                    .and_then(|c| c.get(connection))
                    .and_then(|rec| rec.region(MetaKey::WholeRegion).ok().flatten())
                    .and_then(|r| r.as_extent().copied());

                let needed = match region {
                    Region::Extent(e) => {
                        let mut grown = if ghost > 0 { e.dilate(ghost as i64) } else { e };
                        if let Some(whole) = upstream_whole {
                            grown = grown.intersect(&whole);
                        }
                        Region::Extent(grown)
                    }
                    pieces @ Region::Pieces { .. } => pieces,
                };

                let rec = &mut self.input_requests[port][connection];
                rec.set(MetaKey::UpdateRegion, needed);
                for key in [
                    MetaKey::UpdatePiece,
                    MetaKey::UpdateNumPieces,
                    MetaKey::UpdateGhostLevels,
                    MetaKey::UpdateTimeValue,
                ] {
                    rec.forward(self.request, key);
                }
            }
        }
        Ok(())
    }
}

/// Phase 3 view: input datasets in, output datasets out, plus the node's
/// pass counter, scratch slot, and the cooperative abort signal.
pub struct ComputeContext<'a> {
    pub(crate) inputs: &'a [Vec<Arc<Dataset>>],
    pub(crate) request: &'a mut MetadataRecord,
    pub(crate) outputs_meta: &'a [MetadataRecord],
    pub(crate) outputs: &'a mut [Option<Dataset>],
    pub(crate) pass_index: &'a mut u32,
    pub(crate) scratch: &'a mut Option<Dataset>,
    pub(crate) signal: &'a StopSignal,
}

impl<'a> ComputeContext<'a> {
    pub fn num_input_ports(&self) -> usize {
        self.inputs.len()
    }

    /// All datasets connected to `port`, in edge order. Empty for an
    /// unconnected optional port — absence, not an error.
    pub fn inputs(&self, port: usize) -> &[Arc<Dataset>] {
        self.inputs.get(port).map_or(&[], |c| c.as_slice())
    }

    pub fn input(&self, port: usize, connection: usize) -> Option<&Arc<Dataset>> {
        self.inputs.get(port)?.get(connection)
    }

    /// First dataset on `port`, failing with `MissingInput` when the port
    /// has no connections.
    pub fn required_input(&self, port: usize) -> NodeResult<&Arc<Dataset>> {
        self.input(port, 0).ok_or(NodeError::MissingInput { port })
    }

    pub fn request(&self) -> &MetadataRecord {
        self.request
    }

    pub fn output_meta(&self, port: usize) -> &MetadataRecord {
        &self.outputs_meta[port]
    }

    pub fn requested_region(&self) -> NodeResult<Region> {
        self.request.require_region(MetaKey::UpdateRegion)
    }

    /// The assigned region as a concrete extent. Piece requests that were
    /// not resolvable at negotiation time (no whole region known) are an
    /// error for extent-based nodes.
    pub fn requested_extent(&self) -> NodeResult<Extent> {
        match self.requested_region()? {
            Region::Extent(e) => Ok(e),
            r @ Region::Pieces { .. } => Err(NodeError::InvalidRegion(format!(
                "expected an extent request, got {r:?}"
            ))),
        }
    }

    pub fn requested_time(&self) -> NodeResult<Option<f64>> {
        self.request.double(MetaKey::UpdateTimeValue)
    }

    pub fn set_output(&mut self, port: usize, data: impl Into<Dataset>) {
        self.outputs[port] = Some(data.into());
    }

    /// Set or clear the continue flag in this node's request record. While
    /// set, the executive re-runs phases 2–3 before the update completes.
    pub fn set_continue(&mut self, value: bool) {
        if value {
            self.request.set(MetaKey::ContinueExecuting, true);
        } else {
            self.request.remove(MetaKey::ContinueExecuting);
        }
    }

    pub fn continue_requested(&self) -> bool {
        self.request.flag(MetaKey::ContinueExecuting)
    }

    pub fn pass_index(&self) -> u32 {
        *self.pass_index
    }

    pub fn advance_pass(&mut self) {
        *self.pass_index += 1;
    }

    pub fn reset_pass(&mut self) {
        *self.pass_index = 0;
    }

    pub fn scratch(&self) -> Option<&Dataset> {
        self.scratch.as_ref()
    }

    pub fn take_scratch(&mut self) -> Option<Dataset> {
        self.scratch.take()
    }

    pub fn set_scratch(&mut self, data: impl Into<Dataset>) {
        *self.scratch = Some(data.into());
    }

    /// Cooperative cancellation poll; long computations call this at least
    /// once per unit of progress.
    pub fn is_aborted(&self) -> bool {
        self.signal.is_triggered()
    }
}
