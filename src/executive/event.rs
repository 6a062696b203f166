use serde::Serialize;

use crate::extent::Region;

/// Terminal status of an update request. Cancellation is not an error:
/// the request stopped early with valid-but-possibly-incomplete outputs,
/// and nothing produced by the interrupted pass was cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateStatus {
    Completed,
    Cancelled,
}

/// One entry of the per-request event log.
///
/// The log is the engine's observable protocol trace: which nodes
/// re-described their outputs, which regions were assigned to which ports,
/// which computes ran or were served from cache, and how the continuation
/// flag evolved per pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PipelineEvent {
    DescribeOutput {
        node: String,
    },
    RegionAssigned {
        node: String,
        port: usize,
        region: Region,
    },
    ComputeStarted {
        node: String,
        pass: u32,
    },
    ComputeFinished {
        node: String,
        pass: u32,
        continue_executing: bool,
    },
    ComputeSkipped {
        node: String,
    },
    FanOut {
        node: String,
        leaves_visited: usize,
        leaves_total: usize,
    },
    Cancelled {
        node: String,
    },
}

/// Status and event log of one update request.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub status: UpdateStatus,
    pub events: Vec<PipelineEvent>,
}

impl UpdateOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.status == UpdateStatus::Cancelled
    }

    /// How many times `node`'s compute ran during this request.
    pub fn compute_count(&self, node: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::ComputeStarted { node: n, .. } if n == node))
            .count()
    }

    /// Pass counter values observed at each compute of `node`, in order.
    pub fn passes(&self, node: &str) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::ComputeStarted { node: n, pass } if n == node => Some(*pass),
                _ => None,
            })
            .collect()
    }

    /// Continue-flag states reported after each compute of `node`.
    pub fn continue_flags(&self, node: &str) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::ComputeFinished {
                    node: n,
                    continue_executing,
                    ..
                } if n == node => Some(*continue_executing),
                _ => None,
            })
            .collect()
    }
}
