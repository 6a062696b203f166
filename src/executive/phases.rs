//! The three-phase negotiation/execution engine.
//!
//! Control flows downstream→upstream while negotiating (phases 1–2) and
//! upstream→downstream while computing (phase 3). One [`Executive`] value
//! exists per update request; it borrows the pipeline's graph and state
//! arena and owns the request-scoped context.

use std::collections::HashSet;
use std::sync::Arc;

use petgraph::stable_graph::NodeIndex;
use tracing::{debug, trace};

use super::event::{PipelineEvent, UpdateOutcome, UpdateStatus};
use super::request::{RequestContext, UpdateRequest};
use crate::data::{Dataset, DatasetKind, StructuredData};
use crate::error::{NodeError, PipelineError, PipelineResult};
use crate::extent::translator::TranslatorHandle;
use crate::extent::{DefaultTranslator, Region, RegionTranslator};
use crate::graph::types::PipelineGraph;
use crate::metadata::{MetaKey, MetadataRecord};
use crate::node::context::{ComputeContext, DescribeContext, NegotiateContext};
use crate::node::NodeState;
use crate::signal::StopSignal;

pub(crate) struct Executive<'a> {
    pub graph: &'a PipelineGraph,
    pub states: &'a mut Vec<NodeState>,
    pub counter: &'a mut u64,
    pub signal: StopSignal,
    pub ctx: RequestContext,
}

impl<'a> Executive<'a> {
    pub fn run(
        &mut self,
        target: NodeIndex,
        port: usize,
        request: &UpdateRequest,
    ) -> PipelineResult<UpdateOutcome> {
        self.phase1(target)?;

        let mut status = UpdateStatus::Completed;
        loop {
            self.ctx.begin_pass();
            self.assign_target(target, port, request)?;
            self.phase2(target)?;
            self.execute(target)?;

            if self.ctx.aborted {
                status = UpdateStatus::Cancelled;
                break;
            }

            // Continuation: any node that left its flag set gets another
            // phase 2–3 pass, together with everything downstream of it.
            // Phase 1 is never repeated inside the loop.
            let flagged: Vec<NodeIndex> = self
                .ctx
                .requests
                .iter()
                .filter(|(_, rec)| rec.flag(MetaKey::ContinueExecuting))
                .map(|((node, _), _)| *node)
                .collect();
            self.ctx.continuing = self.downstream_closure(&flagged);
            if self.ctx.continuing.is_empty() {
                break;
            }
            trace!(nodes = self.ctx.continuing.len(), "continue executing");
            if self.signal.is_triggered() {
                self.ctx.continuing.clear();
                status = UpdateStatus::Cancelled;
                break;
            }
        }

        if status == UpdateStatus::Completed && request.exact {
            self.crop_target(target, port);
        }

        Ok(UpdateOutcome {
            status,
            events: std::mem::take(&mut self.ctx.events),
        })
    }

    fn next_stamp(&mut self) -> u64 {
        *self.counter += 1;
        *self.counter
    }

    /// The given nodes plus everything reachable downstream of them.
    fn downstream_closure(&self, nodes: &[NodeIndex]) -> HashSet<NodeIndex> {
        let mut closure = HashSet::new();
        let mut stack: Vec<NodeIndex> = nodes.to_vec();
        while let Some(node) = stack.pop() {
            if closure.insert(node) {
                stack.extend(
                    self.graph
                        .graph
                        .neighbors_directed(node, petgraph::Direction::Outgoing),
                );
            }
        }
        closure
    }

    /// Max of this node's and every ancestor's modification stamp,
    /// memoized for the life of the request.
    fn pipeline_mtime(&mut self, node: NodeIndex) -> u64 {
        if let Some(&m) = self.ctx.mtime.get(&node) {
            return m;
        }
        let mut m = self.states[node.index()].modified;
        for upstream in self.graph.upstream_nodes(node) {
            m = m.max(self.pipeline_mtime(upstream));
        }
        self.ctx.mtime.insert(node, m);
        m
    }

    /// Clone the cached capability records feeding each input connection.
    fn gather_upstream_meta(&self, node: NodeIndex) -> Vec<Vec<MetadataRecord>> {
        (0..self.graph.num_input_ports(node))
            .map(|port| {
                self.graph
                    .connections(node, port)
                    .iter()
                    .map(|ep| self.states[ep.node.index()].output_meta[ep.port].clone())
                    .collect()
            })
            .collect()
    }

    // ---- phase 1: metadata ----

    fn phase1(&mut self, node: NodeIndex) -> PipelineResult<()> {
        // Metadata is always refreshed upstream-first, so a fresh node
        // implies fresh ancestors and the walk can prune here.
        let pm = self.pipeline_mtime(node);
        if self.states[node.index()].info_stamp >= pm {
            return Ok(());
        }
        for upstream in self.graph.upstream_nodes(node) {
            self.phase1(upstream)?;
        }

        let upstream = self.gather_upstream_meta(node);
        let graph_node = self.graph.node(node);
        let st = &mut self.states[node.index()];
        st.output_meta = vec![MetadataRecord::new(); graph_node.outputs.len()];
        st.clear_outputs();

        let mut dctx = DescribeContext {
            upstream: &upstream,
            outputs: &mut st.output_meta,
        };
        graph_node
            .node
            .describe_output(&mut dctx)
            .map_err(|source| PipelineError::MetadataNegotiation {
                node: graph_node.id.clone(),
                source,
            })?;
        st.info_stamp = pm;
        debug!(node = %graph_node.id, "described output metadata");
        self.ctx.events.push(PipelineEvent::DescribeOutput {
            node: graph_node.id.clone(),
        });
        Ok(())
    }

    // ---- phase 2: region negotiation ----

    /// Resolve a region against the capability metadata of `(node, port)`:
    /// piece requests become extents at structured ports through the
    /// port's translator (ghost expansion is left to the per-hop default),
    /// extent requests are checked against the whole region.
    fn resolve_region(
        &self,
        node: NodeIndex,
        port: usize,
        region: Region,
    ) -> PipelineResult<Region> {
        let meta = &self.states[node.index()].output_meta[port];
        let whole = meta
            .region(MetaKey::WholeRegion)
            .ok()
            .flatten()
            .and_then(|r| r.as_extent().copied());

        match region {
            Region::Pieces {
                piece, num_pieces, ..
            } => match whole {
                Some(w) => {
                    let translator: Option<TranslatorHandle> =
                        meta.translator(MetaKey::RegionTranslator).ok().flatten();
                    let resolved = match &translator {
                        Some(t) => t.piece_to_extent(piece, num_pieces, 0, &w),
                        None => DefaultTranslator.piece_to_extent(piece, num_pieces, 0, &w),
                    };
                    Ok(Region::Extent(resolved))
                }
                // No whole region known: the piece request travels as-is.
                None => Ok(region),
            },
            Region::Extent(e) => {
                if let Some(w) = whole {
                    if !w.contains(&e) {
                        return Err(PipelineError::RegionOutsideWhole {
                            node: self.graph.node_id(node).to_string(),
                            requested: region,
                        });
                    }
                }
                Ok(region)
            }
        }
    }

    fn assign_target(
        &mut self,
        target: NodeIndex,
        port: usize,
        request: &UpdateRequest,
    ) -> PipelineResult<()> {
        let region = request.region.unwrap_or_else(Region::whole);
        let resolved = self.resolve_region(target, port, region)?;

        let mut rec = MetadataRecord::new();
        rec.set(MetaKey::UpdateRegion, resolved);
        if let Region::Pieces {
            piece,
            num_pieces,
            ghost_level,
        } = region
        {
            rec.set(MetaKey::UpdatePiece, piece as i64);
            rec.set(MetaKey::UpdateNumPieces, num_pieces as i64);
            rec.set(MetaKey::UpdateGhostLevels, ghost_level as i64);
        }
        if let Some(t) = request.time_value {
            rec.set(MetaKey::UpdateTimeValue, t);
        }
        if request.exact {
            rec.set(MetaKey::ExactRegion, true);
        }
        self.assign(target, port, rec)?;
        Ok(())
    }

    /// Record the request for `(node, port)`. Two consumers asking for
    /// different regions (or time values) of one port within one request
    /// is a negotiation error; an identical repeat is deduplicated.
    fn assign(
        &mut self,
        node: NodeIndex,
        port: usize,
        rec: MetadataRecord,
    ) -> PipelineResult<bool> {
        if let Some(existing) = self.ctx.requests.get(&(node, port)) {
            let same = existing.get(MetaKey::UpdateRegion) == rec.get(MetaKey::UpdateRegion)
                && existing.get(MetaKey::UpdateTimeValue) == rec.get(MetaKey::UpdateTimeValue);
            if same {
                return Ok(false);
            }
            return Err(PipelineError::ConflictingRegion {
                node: self.graph.node_id(node).to_string(),
                port,
            });
        }
        if let Ok(Some(region)) = rec.region(MetaKey::UpdateRegion) {
            self.ctx.events.push(PipelineEvent::RegionAssigned {
                node: self.graph.node_id(node).to_string(),
                port,
                region,
            });
        }
        self.ctx.requests.insert((node, port), rec);
        Ok(true)
    }

    /// The lowest output port a request was assigned to; the record a
    /// node's phase 2/3 callbacks see as "own request".
    fn primary_port(&self, node: NodeIndex) -> PipelineResult<usize> {
        (0..self.graph.num_output_ports(node))
            .find(|p| self.ctx.requests.contains_key(&(node, *p)))
            .ok_or_else(|| {
                PipelineError::Internal(format!(
                    "no request assigned to node {}",
                    self.graph.node_id(node)
                ))
            })
    }

    fn phase2(&mut self, node: NodeIndex) -> PipelineResult<()> {
        let graph = self.graph;
        let num_inputs = graph.num_input_ports(node);
        if num_inputs == 0 {
            return Ok(());
        }
        // Short-circuit: a node whose cache already satisfies its request
        // does not negotiate upstream, so a finished multi-pass node never
        // re-issues its per-pass upstream requests.
        if !self.need_to_execute(node) {
            return Ok(());
        }

        let port = self.primary_port(node)?;
        let request = self.ctx.requests[&(node, port)].clone();
        let outputs = self.states[node.index()].output_meta.clone();
        let upstream = self.gather_upstream_meta(node);
        let pass_index = self.states[node.index()].pass_index;
        let mut input_requests: Vec<Vec<MetadataRecord>> = (0..num_inputs)
            .map(|p| vec![MetadataRecord::new(); graph.connections(node, p).len()])
            .collect();

        {
            let mut nctx = NegotiateContext {
                request: &request,
                outputs: &outputs,
                upstream: &upstream,
                input_requests: &mut input_requests,
                pass_index,
            };
            graph
                .node(node)
                .node
                .describe_needed_input(&mut nctx)
                .map_err(|source| PipelineError::MetadataNegotiation {
                    node: graph.node_id(node).to_string(),
                    source,
                })?;
        }

        for (p, records) in input_requests.into_iter().enumerate() {
            let endpoints = graph.connections(node, p).to_vec();
            for (c, mut rec) in records.into_iter().enumerate() {
                let endpoint = endpoints[c];
                let region = rec
                    .region(MetaKey::UpdateRegion)
                    .ok()
                    .flatten()
                    .ok_or_else(|| PipelineError::MetadataNegotiation {
                        node: graph.node_id(node).to_string(),
                        source: NodeError::MissingMetadata(MetaKey::UpdateRegion),
                    })?;
                let resolved = self.resolve_region(endpoint.node, endpoint.port, region)?;
                rec.set(MetaKey::UpdateRegion, resolved);
                if self.assign(endpoint.node, endpoint.port, rec)? {
                    self.phase2(endpoint.node)?;
                }
            }
        }
        Ok(())
    }

    // ---- phase 3: computation ----

    fn execute(&mut self, node: NodeIndex) -> PipelineResult<()> {
        if self.ctx.executed.contains(&node) || self.ctx.aborted {
            return Ok(());
        }
        // Only recurse where phase 2 actually assigned a request; a
        // short-circuited subgraph serves straight from its caches.
        for upstream in self.graph.upstream_nodes(node) {
            if !self.has_assignment(upstream) {
                continue;
            }
            self.execute(upstream)?;
            if self.ctx.aborted {
                return Ok(());
            }
        }
        self.ctx.executed.insert(node);

        if !self.need_to_execute(node) {
            trace!(node = %self.graph.node_id(node), "cache hit");
            self.ctx.events.push(PipelineEvent::ComputeSkipped {
                node: self.graph.node_id(node).to_string(),
            });
            return Ok(());
        }

        let inputs = self.gather_inputs(node)?;
        match self.find_fan_out_port(node, &inputs) {
            Some(port) => self.fan_out(node, port, inputs),
            None => self.run_compute(node, inputs),
        }
    }

    fn has_assignment(&self, node: NodeIndex) -> bool {
        (0..self.graph.num_output_ports(node))
            .any(|port| self.ctx.requests.contains_key(&(node, port)))
    }

    fn max_upstream_version(&self, node: NodeIndex) -> u64 {
        let mut max = 0;
        for port in 0..self.graph.num_input_ports(node) {
            for endpoint in self.graph.connections(node, port) {
                max = max.max(self.states[endpoint.node.index()].data_version);
            }
        }
        max
    }

    fn need_to_execute(&mut self, node: NodeIndex) -> bool {
        if self.ctx.continuing.contains(&node) {
            return true;
        }
        let pm = self.pipeline_mtime(node);
        let max_upstream = self.max_upstream_version(node);
        let st = &self.states[node.index()];
        if st.computed_at < pm || max_upstream > st.inputs_version {
            return true;
        }
        for port in 0..self.graph.num_output_ports(node) {
            let Some(rec) = self.ctx.requests.get(&(node, port)) else {
                continue;
            };
            if st.output_data[port].is_none() {
                return true;
            }
            let Ok(Some(requested)) = rec.region(MetaKey::UpdateRegion) else {
                return true;
            };
            match (st.cached_region[port], requested) {
                // A cached extent covering the request satisfies it.
                (Some(Region::Extent(cached)), Region::Extent(req)) => {
                    if !cached.contains(&req) {
                        return true;
                    }
                }
                (Some(cached), req) => {
                    if cached != req {
                        return true;
                    }
                }
                (None, _) => return true,
            }
            let requested_time = rec.double(MetaKey::UpdateTimeValue).ok().flatten();
            if requested_time != st.cached_time[port] {
                return true;
            }
        }
        false
    }

    fn gather_inputs(&self, node: NodeIndex) -> PipelineResult<Vec<Vec<Arc<Dataset>>>> {
        let mut inputs = Vec::with_capacity(self.graph.num_input_ports(node));
        for port in 0..self.graph.num_input_ports(node) {
            let mut connections = Vec::new();
            for endpoint in self.graph.connections(node, port) {
                let data = self.states[endpoint.node.index()].output_data[endpoint.port]
                    .clone()
                    .ok_or_else(|| {
                        PipelineError::Internal(format!(
                            "upstream node {} produced no output",
                            self.graph.node_id(endpoint.node)
                        ))
                    })?;
                connections.push(data);
            }
            inputs.push(connections);
        }
        Ok(inputs)
    }

    /// First input port whose declaration demands leaf-by-leaf fan-out of
    /// an arriving composite container.
    fn find_fan_out_port(&self, node: NodeIndex, inputs: &[Vec<Arc<Dataset>>]) -> Option<usize> {
        let declarations = &self.graph.node(node).inputs;
        for (port, declaration) in declarations.iter().enumerate() {
            if let Some(first) = inputs.get(port).and_then(|c| c.first()) {
                if declaration.wants_fan_out(first.kind()) {
                    return Some(port);
                }
            }
        }
        None
    }

    /// Drive one `compute` call, emitting start/finish events and mapping
    /// failures to the computation error class. Returns the produced
    /// output slots; the caller decides what to cache.
    fn invoke(
        &mut self,
        node: NodeIndex,
        inputs: &[Vec<Arc<Dataset>>],
        rec: &mut MetadataRecord,
    ) -> PipelineResult<Vec<Option<Dataset>>> {
        let graph_node = self.graph.node(node);
        let id = graph_node.id.clone();
        let num_outputs = graph_node.outputs.len();
        let signal = self.signal.clone();

        let pass_before = self.states[node.index()].pass_index;
        self.ctx.events.push(PipelineEvent::ComputeStarted {
            node: id.clone(),
            pass: pass_before,
        });
        trace!(node = %id, pass = pass_before, "compute");

        let mut outputs: Vec<Option<Dataset>> = vec![None; num_outputs];
        let st = &mut self.states[node.index()];
        let result = {
            let mut cctx = ComputeContext {
                inputs,
                request: rec,
                outputs_meta: &st.output_meta,
                outputs: &mut outputs,
                pass_index: &mut st.pass_index,
                scratch: &mut st.scratch,
                signal: &signal,
            };
            graph_node.node.compute(&mut cctx)
        };

        // A triggered signal outranks the node's own result: the partial
        // output is discarded either way.
        if signal.is_triggered() {
            self.ctx.aborted = true;
            self.ctx.events.push(PipelineEvent::Cancelled { node: id });
            return Ok(Vec::new());
        }
        if let Err(source) = result {
            return Err(PipelineError::Compute { node: id, source });
        }
        self.ctx.events.push(PipelineEvent::ComputeFinished {
            node: id,
            pass: pass_before,
            continue_executing: rec.flag(MetaKey::ContinueExecuting),
        });
        Ok(outputs)
    }

    /// Cache freshly produced outputs and stamp the node up to date.
    fn commit(&mut self, node: NodeIndex, outputs: Vec<Option<Dataset>>) {
        let pm = self.pipeline_mtime(node);
        let max_upstream = self.max_upstream_version(node);
        let version = self.next_stamp();

        let num_outputs = self.graph.num_output_ports(node);
        let port_requests: Vec<(Option<Region>, Option<f64>)> = (0..num_outputs)
            .map(|port| match self.ctx.requests.get(&(node, port)) {
                Some(rec) => (
                    rec.region(MetaKey::UpdateRegion).ok().flatten(),
                    rec.double(MetaKey::UpdateTimeValue).ok().flatten(),
                ),
                None => (None, None),
            })
            .collect();

        let st = &mut self.states[node.index()];
        st.computed_at = pm;
        st.data_version = version;
        st.inputs_version = max_upstream;
        for (port, slot) in outputs.into_iter().enumerate() {
            if let Some(data) = slot {
                st.output_data[port] = Some(Arc::new(data));
                st.cached_region[port] = port_requests[port].0;
                st.cached_time[port] = port_requests[port].1;
            }
        }
    }

    fn run_compute(
        &mut self,
        node: NodeIndex,
        inputs: Vec<Vec<Arc<Dataset>>>,
    ) -> PipelineResult<()> {
        let key = (node, self.primary_port(node)?);
        let mut rec = self.ctx.requests[&key].clone();

        let outputs = self.invoke(node, &inputs, &mut rec)?;
        if self.ctx.aborted {
            return Ok(());
        }
        self.commit(node, outputs);
        self.ctx.requests.insert(key, rec);
        Ok(())
    }

    /// Composite fan-out (§ composite semantics): visit the container's
    /// leaves in priority order through the node's single-dataset path.
    /// Leaf outputs either mirror the container structure or, when the
    /// node's output port declares a leaf kind, merge fill-only-empty into
    /// one structured dataset; fully resolved targets skip the remaining
    /// leaves.
    fn fan_out(
        &mut self,
        node: NodeIndex,
        fan_port: usize,
        inputs: Vec<Vec<Arc<Dataset>>>,
    ) -> PipelineResult<()> {
        let id = self.graph.node_id(node).to_string();
        let key = (node, self.primary_port(node)?);
        let mut rec = self.ctx.requests[&key].clone();

        let container_arc = inputs[fan_port][0].clone();
        let Some(container) = container_arc.as_composite() else {
            return Err(PipelineError::Internal(format!(
                "fan-out port of node {id} did not receive a composite"
            )));
        };
        let leaves = container.leaves();
        let leaves_total = leaves.len();
        let output_kind = self.graph.node(node).outputs[0].kind;

        let merge_target = match output_kind {
            DatasetKind::Composite | DatasetKind::Any => None,
            _ => {
                let extent = rec
                    .region(MetaKey::UpdateRegion)
                    .ok()
                    .flatten()
                    .and_then(|r| r.as_extent().copied())
                    .ok_or_else(|| PipelineError::Compute {
                        node: id.clone(),
                        source: NodeError::InvalidRegion(
                            "fan-out merge needs an extent request".to_string(),
                        ),
                    })?;
                Some(StructuredData::unresolved(extent))
            }
        };

        let mut mirrored = container.same_structure_empty();
        let mut merged = merge_target;
        let mut visited = 0;

        for leaf in &leaves {
            if let Some(target) = &merged {
                if target.fully_resolved() {
                    break;
                }
            }
            if self.signal.is_triggered() {
                self.ctx.aborted = true;
                self.ctx.events.push(PipelineEvent::Cancelled { node: id });
                return Ok(());
            }

            let mut leaf_inputs = inputs.clone();
            leaf_inputs[fan_port][0] = Arc::new(leaf.data.clone());
            let mut outputs = self.invoke(node, &leaf_inputs, &mut rec)?;
            if self.ctx.aborted {
                return Ok(());
            }
            visited += 1;

            let produced = outputs.get_mut(0).and_then(|slot| slot.take());
            match (&mut merged, produced) {
                (Some(target), Some(Dataset::Structured(d))) => {
                    target.fill_empty_from(&d);
                }
                (Some(_), _) => {}
                (None, Some(data)) => mirrored.set_leaf(leaf.path, data),
                (None, None) => {}
            }
        }

        let combined = match merged {
            Some(target) => Dataset::Structured(target),
            None => Dataset::Composite(mirrored),
        };
        let mut outputs: Vec<Option<Dataset>> =
            vec![None; self.graph.num_output_ports(node)];
        outputs[0] = Some(combined);
        self.commit(node, outputs);
        self.ctx.requests.insert(key, rec);

        debug!(node = %id, visited, total = leaves_total, "composite fan-out");
        self.ctx.events.push(PipelineEvent::FanOut {
            node: id,
            leaves_visited: visited,
            leaves_total,
        });
        Ok(())
    }

    /// Exact-region supplement: shrink the target's cached structured
    /// output to the requested extent before it is handed out.
    fn crop_target(&mut self, target: NodeIndex, port: usize) {
        let Some(rec) = self.ctx.requests.get(&(target, port)) else {
            return;
        };
        let Ok(Some(Region::Extent(requested))) = rec.region(MetaKey::UpdateRegion) else {
            return;
        };
        let st = &mut self.states[target.index()];
        let Some(cached) = &st.output_data[port] else {
            return;
        };
        if let Dataset::Structured(d) = &**cached {
            if *d.extent() != requested {
                let cropped = d.crop(&requested);
                st.output_data[port] = Some(Arc::new(Dataset::Structured(cropped)));
                st.cached_region[port] = Some(Region::Extent(requested));
            }
        }
    }
}
