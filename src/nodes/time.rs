use crate::data::{Dataset, DatasetKind, TableData};
use crate::error::{NodeError, NodeResult};
use crate::graph::port::{InputPort, OutputPort};
use crate::metadata::MetaKey;
use crate::node::{ComputeContext, NegotiateContext, PipelineNode};

/// Collects one table row per upstream time value.
///
/// The first continuation pattern: the upstream source declares
/// `TimeValues`, and this node runs one phase 2–3 pass per value. During
/// negotiation pass `k` it requests `TimeValues[k]` from its input; during
/// computation it appends `(time, mean)` of the received dataset to the
/// accumulating table, keeps the continue flag set while values remain,
/// and clears it on the last pass. The table carries one populated row
/// per time value after a single top-level update.
pub struct TimeSeriesCollector;

impl TimeSeriesCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TimeSeriesCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Time values forwarded into the collector's capability record by the
/// default `describe_output`.
fn known_times(record: &crate::metadata::MetadataRecord) -> Vec<f64> {
    record
        .double_vec(MetaKey::TimeValues)
        .ok()
        .flatten()
        .unwrap_or_default()
}

impl PipelineNode for TimeSeriesCollector {
    fn input_ports(&self) -> Vec<InputPort> {
        vec![InputPort::single(&[DatasetKind::Structured])]
    }

    fn output_ports(&self) -> Vec<OutputPort> {
        vec![OutputPort::of(DatasetKind::Table)]
    }

    fn describe_needed_input(&self, ctx: &mut NegotiateContext<'_>) -> NodeResult<()> {
        ctx.pass_through()?;
        let times = known_times(ctx.output(0));
        if !times.is_empty() {
            let k = (ctx.pass_index() as usize).min(times.len() - 1);
            let time = times[k];
            for connection in 0..ctx.num_connections(0) {
                ctx.input_request_mut(0, connection)
                    .set(MetaKey::UpdateTimeValue, time);
            }
        }
        Ok(())
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> NodeResult<()> {
        let times = known_times(ctx.output_meta(0));
        let input = ctx.required_input(0)?;
        let data = input.as_structured().ok_or(NodeError::InputKind {
            port: 0,
            expected: DatasetKind::Structured,
            found: input.kind(),
        })?;

        // Mean over the resolved points of the first array.
        let mean = match data.array_names().next() {
            Some(name) => {
                let name = name.to_string();
                let mut sum = 0.0;
                let mut count = 0u64;
                for p in data.extent().points() {
                    if let Some(v) = data.value(&name, p) {
                        sum += v;
                        count += 1;
                    }
                }
                if count > 0 {
                    sum / count as f64
                } else {
                    f64::NAN
                }
            }
            None => f64::NAN,
        };

        let pass = ctx.pass_index() as usize;
        let time = times.get(pass).copied().unwrap_or(0.0);
        let mut table = match ctx.take_scratch() {
            Some(Dataset::Table(t)) => t,
            _ => TableData::new(),
        };
        table.push_row(&[("time", time), ("mean", mean)]);

        if pass + 1 < times.len() {
            ctx.set_scratch(table.clone());
            ctx.advance_pass();
            ctx.set_continue(true);
        } else {
            ctx.reset_pass();
            ctx.set_continue(false);
        }
        ctx.set_output(0, table);
        Ok(())
    }
}
