use std::sync::Arc;

use crate::data::{CompositeData, Dataset, DatasetKind, StructuredData};
use crate::error::NodeResult;
use crate::extent::translator::TranslatorHandle;
use crate::extent::{BlockTranslator, Extent, Region, RegionTranslator};
use crate::graph::port::OutputPort;
use crate::metadata::MetaKey;
use crate::node::{ComputeContext, DescribeContext, PipelineNode};

/// Structured source producing a linear ramp over its whole extent:
/// `value(p) = x + 1e4*y + 1e8*z + t`, with `t` the requested time value.
///
/// Declares a [`BlockTranslator`] so downstream piece requests resolve to
/// proper sub-extents, and produces exactly the requested region — the
/// streaming-friendly half of the source contract.
pub struct RampSource {
    whole: Extent,
    array: String,
    time_values: Vec<f64>,
}

impl RampSource {
    pub fn new(whole: Extent) -> Self {
        Self {
            whole,
            array: "values".to_string(),
            time_values: Vec::new(),
        }
    }

    pub fn with_array(mut self, name: impl Into<String>) -> Self {
        self.array = name.into();
        self
    }

    /// Declare discrete time values; the produced ramp is shifted by the
    /// requested time.
    pub fn with_time_values(mut self, time_values: Vec<f64>) -> Self {
        self.time_values = time_values;
        self
    }
}

impl PipelineNode for RampSource {
    fn output_ports(&self) -> Vec<OutputPort> {
        vec![OutputPort::of(DatasetKind::Structured)]
    }

    fn describe_output(&self, ctx: &mut DescribeContext<'_>) -> NodeResult<()> {
        let out = ctx.output_mut(0);
        out.set(MetaKey::WholeRegion, Region::Extent(self.whole));
        let translator: TranslatorHandle = Arc::new(BlockTranslator);
        out.set(MetaKey::RegionTranslator, translator);
        if !self.time_values.is_empty() {
            out.set(MetaKey::TimeValues, self.time_values.clone());
            let first = self.time_values[0];
            let last = self.time_values[self.time_values.len() - 1];
            out.set(MetaKey::TimeRange, vec![first, last]);
        }
        Ok(())
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> NodeResult<()> {
        let extent = match ctx.requested_region()? {
            Region::Extent(e) => e,
            Region::Pieces {
                piece, num_pieces, ..
            } => BlockTranslator.piece_to_extent(piece, num_pieces, 0, &self.whole),
        };
        let extent = extent.intersect(&self.whole);
        let t = match ctx.requested_time()? {
            Some(t) => t,
            None => self.time_values.first().copied().unwrap_or(0.0),
        };

        let mut data = StructuredData::unresolved(extent);
        for p in extent.points() {
            data.set_value(
                &self.array,
                p,
                p[0] as f64 + 1e4 * p[1] as f64 + 1e8 * p[2] as f64 + t,
            );
            // One abort poll per finished row.
            if p[0] == extent.max[0] && ctx.is_aborted() {
                return Ok(());
            }
        }
        ctx.set_output(0, data);
        Ok(())
    }
}

/// Source emitting a pre-built composite container, with the bounding
/// union of its structured leaves as the whole region.
pub struct CompositeSource {
    container: CompositeData,
}

impl CompositeSource {
    pub fn new(container: CompositeData) -> Self {
        Self { container }
    }
}

impl PipelineNode for CompositeSource {
    fn output_ports(&self) -> Vec<OutputPort> {
        vec![OutputPort::of(DatasetKind::Composite)]
    }

    fn describe_output(&self, ctx: &mut DescribeContext<'_>) -> NodeResult<()> {
        let bounds = self.container.bounds();
        if !bounds.is_empty() {
            ctx.output_mut(0)
                .set(MetaKey::WholeRegion, Region::Extent(bounds));
        }
        Ok(())
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> NodeResult<()> {
        ctx.set_output(0, Dataset::Composite(self.container.clone()));
        Ok(())
    }
}
