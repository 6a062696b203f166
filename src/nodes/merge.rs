use crate::data::composite::merge_fill_empty;
use crate::data::{DatasetKind, StructuredData};
use crate::error::{NodeError, NodeResult};
use crate::graph::port::{InputPort, OutputPort};
use crate::node::{ComputeContext, PipelineNode};

/// Flattens a composite container into one structured dataset over the
/// requested region.
///
/// Declares a composite-accepting input, so the executive hands it the
/// container whole instead of fanning out — the opt-in side of composite
/// handling. Leaves are merged fill-only-empty in priority order (finest
/// level first); once every location is resolved the remaining leaves are
/// not visited.
pub struct LeafProbe;

impl PipelineNode for LeafProbe {
    fn input_ports(&self) -> Vec<InputPort> {
        vec![InputPort::single(&[DatasetKind::Composite])]
    }

    fn output_ports(&self) -> Vec<OutputPort> {
        vec![OutputPort::of(DatasetKind::Structured)]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> NodeResult<()> {
        let extent = ctx.requested_extent()?;
        let input = ctx.required_input(0)?;
        let container = input.as_composite().ok_or(NodeError::InputKind {
            port: 0,
            expected: DatasetKind::Composite,
            found: input.kind(),
        })?;

        let mut target = StructuredData::unresolved(extent);
        merge_fill_empty(&mut target, &container.leaves());
        ctx.set_output(0, target);
        Ok(())
    }
}
