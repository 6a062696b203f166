use std::sync::Arc;

use crate::data::Dataset;
use crate::extent::Region;
use crate::metadata::MetadataRecord;

/// Per-node execution state, owned by the pipeline's state arena and
/// addressed by the stable graph node index.
///
/// All stamps are logical values drawn from one per-pipeline monotonic
/// counter. A node's cached information is valid while `info_stamp` is not
/// exceeded by any ancestor's `modified`; cached data additionally tracks
/// the versions of the inputs it was computed from.
#[derive(Debug)]
pub struct NodeState {
    /// Stamp of the last `mark_modified` on this node.
    pub modified: u64,
    /// Pipeline stamp at which `describe_output` last ran.
    pub info_stamp: u64,
    /// Pipeline stamp at which `compute` last ran.
    pub computed_at: u64,
    /// Stamp issued to the data produced by the last compute.
    pub data_version: u64,
    /// Highest upstream `data_version` consumed by the last compute.
    pub inputs_version: u64,
    /// Cached capability metadata, one record per output port.
    pub output_meta: Vec<MetadataRecord>,
    /// Cached output datasets, one slot per output port.
    pub output_data: Vec<Option<Arc<Dataset>>>,
    /// Region each cached output satisfies.
    pub cached_region: Vec<Option<Region>>,
    /// Time value each cached output was computed for.
    pub cached_time: Vec<Option<f64>>,
    /// Continuation pass counter; advanced and reset by node code only.
    pub pass_index: u32,
    /// Scratch slot for multi-pass nodes (intermediate results).
    pub scratch: Option<Dataset>,
}

impl NodeState {
    pub fn new(num_outputs: usize) -> Self {
        Self {
            modified: 0,
            info_stamp: 0,
            computed_at: 0,
            data_version: 0,
            inputs_version: 0,
            output_meta: vec![MetadataRecord::new(); num_outputs],
            output_data: vec![None; num_outputs],
            cached_region: vec![None; num_outputs],
            cached_time: vec![None; num_outputs],
            pass_index: 0,
            scratch: None,
        }
    }

    /// Drop cached outputs and reset the per-request bookkeeping. Called
    /// when the node is about to re-describe its outputs.
    pub fn clear_outputs(&mut self) {
        for slot in &mut self.output_data {
            *slot = None;
        }
        for region in &mut self.cached_region {
            *region = None;
        }
        for time in &mut self.cached_time {
            *time = None;
        }
    }
}
