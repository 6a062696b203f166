use crate::data::{Dataset, DatasetKind, StructuredData};
use crate::error::{NodeError, NodeResult};
use crate::extent::{Extent, Region};
use crate::graph::port::{InputPort, OutputPort};
use crate::metadata::MetaKey;
use crate::node::{ComputeContext, NegotiateContext, PipelineNode};

/// Identity filter: forwards its input dataset unchanged. Default
/// negotiation behavior throughout, which makes it the reference
/// pass-through hop for region requests.
pub struct PassThrough;

impl PipelineNode for PassThrough {
    fn input_ports(&self) -> Vec<InputPort> {
        vec![InputPort::single_any()]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> NodeResult<()> {
        let input = ctx.required_input(0)?.clone();
        ctx.set_output(0, (*input).clone());
        Ok(())
    }
}

/// Grow every extent request in `ctx` by `radius`, clamped to the upstream
/// whole extent. Applied on top of the default pass-through, so ghost
/// levels and stencil radii stack.
fn dilate_inputs(ctx: &mut NegotiateContext<'_>, radius: i64) {
    for port in 0..ctx.num_input_ports() {
        for connection in 0..ctx.num_connections(port) {
            let whole = ctx
                .upstream(port, connection)
                .and_then(|rec| rec.region(MetaKey::WholeRegion).ok().flatten())
                .and_then(|r| r.as_extent().copied());
            let rec = ctx.input_request_mut(port, connection);
            if let Ok(Some(Region::Extent(e))) = rec.region(MetaKey::UpdateRegion) {
                let mut grown = e.dilate(radius);
                if let Some(w) = whole {
                    grown = grown.intersect(&w);
                }
                rec.set(MetaKey::UpdateRegion, Region::Extent(grown));
            }
        }
    }
}

fn structured_input<'a>(ctx: &'a ComputeContext<'_>, port: usize) -> NodeResult<&'a StructuredData> {
    let input = ctx.required_input(port)?;
    input
        .as_structured()
        .ok_or(NodeError::InputKind {
            port,
            expected: DatasetKind::Structured,
            found: input.kind(),
        })
}

/// Mean over the resolved samples of `source` inside a box of `radius`
/// around each target point; axes outside `axes` are not traversed.
fn box_average(
    source: &StructuredData,
    target: Extent,
    radius: i64,
    axes: &[usize],
) -> StructuredData {
    let mut out = StructuredData::unresolved(target);
    let names: Vec<String> = source.array_names().map(str::to_string).collect();
    for name in &names {
        for p in target.points() {
            let mut sum = 0.0;
            let mut count = 0u32;
            let mut offsets = vec![[0i64; 3]];
            for &axis in axes {
                let mut next = Vec::new();
                for base in &offsets {
                    for d in -radius..=radius {
                        let mut q = *base;
                        q[axis] = d;
                        next.push(q);
                    }
                }
                offsets = next;
            }
            for offset in &offsets {
                let q = [p[0] + offset[0], p[1] + offset[1], p[2] + offset[2]];
                if let Some(v) = source.value(name, q) {
                    sum += v;
                    count += 1;
                }
            }
            if count > 0 {
                out.set_value(name, p, sum / count as f64);
            }
        }
    }
    out
}

/// Box smoothing filter with a stencil of `radius` index units.
///
/// The spatially decomposing case of the negotiation protocol: its input
/// request is the output request dilated by the stencil radius, so a piece
/// request downstream still sees correct values at piece boundaries.
/// Boundary points average over whatever samples exist.
pub struct BoxSmooth {
    radius: i64,
}

impl BoxSmooth {
    pub fn new(radius: i64) -> Self {
        Self { radius }
    }
}

impl PipelineNode for BoxSmooth {
    fn input_ports(&self) -> Vec<InputPort> {
        vec![InputPort::single(&[DatasetKind::Structured])]
    }

    fn output_ports(&self) -> Vec<OutputPort> {
        vec![OutputPort::of(DatasetKind::Structured)]
    }

    fn describe_needed_input(&self, ctx: &mut NegotiateContext<'_>) -> NodeResult<()> {
        ctx.pass_through()?;
        dilate_inputs(ctx, self.radius);
        Ok(())
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> NodeResult<()> {
        let source = structured_input(ctx, 0)?.clone();
        let target = ctx.requested_extent()?.intersect(source.extent());
        if ctx.is_aborted() {
            return Ok(());
        }
        let out = box_average(&source, target, self.radius, &[0, 1, 2]);
        ctx.set_output(0, out);
        Ok(())
    }
}

/// Box smoothing decomposed into one sub-pass per axis.
///
/// The second continuation pattern: pass `k` smooths along axis `k`, the
/// intermediate result travels through the scratch slot to the next pass,
/// and only the final pass's output is what downstream consumers observe
/// once the request completes.
pub struct SeparableSmooth {
    radius: i64,
}

impl SeparableSmooth {
    pub fn new(radius: i64) -> Self {
        Self { radius }
    }
}

impl PipelineNode for SeparableSmooth {
    fn input_ports(&self) -> Vec<InputPort> {
        vec![InputPort::single(&[DatasetKind::Structured])]
    }

    fn output_ports(&self) -> Vec<OutputPort> {
        vec![OutputPort::of(DatasetKind::Structured)]
    }

    fn describe_needed_input(&self, ctx: &mut NegotiateContext<'_>) -> NodeResult<()> {
        ctx.pass_through()?;
        dilate_inputs(ctx, self.radius);
        Ok(())
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> NodeResult<()> {
        let pass = ctx.pass_index() as usize;
        let source = if pass == 0 {
            structured_input(ctx, 0)?.clone()
        } else {
            match ctx.scratch() {
                Some(Dataset::Structured(d)) => d.clone(),
                _ => {
                    return Err(NodeError::Compute(
                        "intermediate pass result missing".to_string(),
                    ))
                }
            }
        };
        let target = ctx.requested_extent()?.intersect(source.extent());
        if ctx.is_aborted() {
            return Ok(());
        }

        let out = box_average(&source, target, self.radius, &[pass]);
        if pass < 2 {
            ctx.set_scratch(out.clone());
            ctx.advance_pass();
            ctx.set_continue(true);
        } else {
            ctx.take_scratch();
            ctx.reset_pass();
            ctx.set_continue(false);
        }
        ctx.set_output(0, out);
        Ok(())
    }
}
