//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use xpipeline::extent::Extent;
use xpipeline::graph::{InputPort, OutputPort};
use xpipeline::node::{ComputeContext, PipelineNode};
use xpipeline::{Dataset, DatasetKind, NodeResult, StructuredData};

/// One-dimensional grid `[lo, hi]` holding a constant value.
pub fn grid(lo: i64, hi: i64, value: f64) -> Dataset {
    Dataset::Structured(StructuredData::from_fn(
        Extent::line(lo, hi),
        "v",
        move |_| value,
    ))
}

/// Structured-only identity node with a configurable output kind; the
/// declared kind decides whether composite fan-out mirrors or merges.
pub struct LeafPass {
    pub kind: DatasetKind,
}

impl PipelineNode for LeafPass {
    fn input_ports(&self) -> Vec<InputPort> {
        vec![InputPort::single(&[DatasetKind::Structured])]
    }

    fn output_ports(&self) -> Vec<OutputPort> {
        vec![OutputPort::of(self.kind)]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> NodeResult<()> {
        let input = ctx.required_input(0)?.clone();
        ctx.set_output(0, (*input).clone());
        Ok(())
    }
}
