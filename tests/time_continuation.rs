//! The continuation loop: time-stepped collection, per-axis sub-passes,
//! and cancellation between passes.

use std::sync::{Arc, OnceLock};

use xpipeline::extent::Extent;
use xpipeline::node::{ComputeContext, PipelineNode};
use xpipeline::nodes::{PassThrough, RampSource, SeparableSmooth, TimeSeriesCollector};
use xpipeline::{NodeResult, PipelineBuilder, StopSignal};

#[test]
fn test_collector_takes_one_pass_per_time_value() {
    let times = vec![0.0, 0.25, 0.5, 0.75, 1.0];
    let mut b = PipelineBuilder::new();
    b.add_node(
        "source",
        Box::new(RampSource::new(Extent::line(0, 9)).with_time_values(times.clone())),
    )
    .unwrap();
    b.add_node("collect", Box::new(TimeSeriesCollector::new()))
        .unwrap();
    b.connect("source", 0, "collect", 0).unwrap();
    let mut pipeline = b.build().unwrap();

    let outcome = pipeline.update("collect", 0).unwrap();

    // Exactly one compute per time value, pass counter in order.
    assert_eq!(outcome.compute_count("collect"), 5);
    assert_eq!(outcome.passes("collect"), vec![0, 1, 2, 3, 4]);
    assert_eq!(outcome.compute_count("source"), 5);

    // The continue flag transitions set -> cleared exactly once.
    let flags = outcome.continue_flags("collect");
    assert_eq!(flags, vec![true, true, true, true, false]);
    let transitions = flags
        .windows(2)
        .filter(|w| w[0] && !w[1])
        .count();
    assert_eq!(transitions, 1);

    // One populated row per time value after a single top-level update.
    let output = pipeline.output("collect", 0).unwrap().unwrap();
    let table = output.as_table().unwrap();
    assert_eq!(table.num_rows(), 5);
    assert_eq!(table.column("time").unwrap(), times.as_slice());
    // The ramp over [0,9] has mean 4.5, shifted by the time value.
    let means: Vec<f64> = times.iter().map(|t| 4.5 + t).collect();
    assert_eq!(table.column("mean").unwrap(), means.as_slice());
}

#[test]
fn test_collector_result_is_cached_like_any_other() {
    let mut b = PipelineBuilder::new();
    b.add_node(
        "source",
        Box::new(RampSource::new(Extent::line(0, 9)).with_time_values(vec![0.0, 1.0])),
    )
    .unwrap();
    b.add_node("collect", Box::new(TimeSeriesCollector::new()))
        .unwrap();
    b.connect("source", 0, "collect", 0).unwrap();
    let mut pipeline = b.build().unwrap();

    pipeline.update("collect", 0).unwrap();
    let outcome = pipeline.update("collect", 0).unwrap();
    assert_eq!(outcome.compute_count("collect"), 0);
    assert_eq!(outcome.compute_count("source"), 0);

    let output = pipeline.output("collect", 0).unwrap().unwrap();
    assert_eq!(output.as_table().unwrap().num_rows(), 2);
}

#[test]
fn test_separable_smooth_runs_one_pass_per_axis() {
    let mut b = PipelineBuilder::new();
    b.add_node("source", Box::new(RampSource::new(Extent::line(0, 9))))
        .unwrap();
    b.add_node("smooth", Box::new(SeparableSmooth::new(1))).unwrap();
    b.add_node("sink", Box::new(PassThrough)).unwrap();
    b.connect("source", 0, "smooth", 0).unwrap();
    b.connect("smooth", 0, "sink", 0).unwrap();
    let mut pipeline = b.build().unwrap();

    let outcome = pipeline.update("sink", 0).unwrap();
    assert_eq!(outcome.compute_count("smooth"), 3);
    assert_eq!(outcome.passes("smooth"), vec![0, 1, 2]);
    assert_eq!(outcome.continue_flags("smooth"), vec![true, true, false]);
    // The upstream source computes once; later passes reuse its cache.
    assert_eq!(outcome.compute_count("source"), 1);

    // Only the final pass is visible downstream: for 1-D data the axis 1
    // and 2 passes are identities, so the result equals one axis-0 pass.
    let output = pipeline.output("sink", 0).unwrap().unwrap();
    let d = output.as_structured().unwrap();
    assert_eq!(d.value("values", [5, 0, 0]), Some(5.0));
    assert_eq!(d.value("values", [0, 0, 0]), Some(0.5));
    assert_eq!(d.value("values", [9, 0, 0]), Some(8.5));
}

/// Keeps requesting passes up to `total`, triggering the abort signal
/// from inside the given pass.
struct CancellingLooper {
    total: u32,
    trigger_at: u32,
    signal: Arc<OnceLock<StopSignal>>,
}

impl PipelineNode for CancellingLooper {
    fn compute(&self, ctx: &mut ComputeContext<'_>) -> NodeResult<()> {
        let pass = ctx.pass_index();
        if pass == self.trigger_at {
            if let Some(signal) = self.signal.get() {
                signal.trigger();
            }
        }
        if pass + 1 < self.total {
            ctx.advance_pass();
            ctx.set_continue(true);
        } else {
            ctx.reset_pass();
            ctx.set_continue(false);
        }
        ctx.set_output(
            0,
            xpipeline::StructuredData::from_fn(Extent::line(0, 0), "v", |_| pass as f64),
        );
        Ok(())
    }
}

#[test]
fn test_cancellation_stops_the_continuation_loop() {
    let slot = Arc::new(OnceLock::new());
    let mut b = PipelineBuilder::new();
    b.add_node(
        "looper",
        Box::new(CancellingLooper {
            total: 100,
            trigger_at: 1,
            signal: slot.clone(),
        }),
    )
    .unwrap();
    let mut pipeline = b.build().unwrap();
    slot.set(pipeline.stop_signal()).ok();

    let outcome = pipeline.update("looper", 0).unwrap();
    assert!(outcome.is_cancelled());
    // Pass 0 ran to completion, pass 1 tripped the signal; the loop never
    // reached the remaining 98 passes.
    assert_eq!(outcome.compute_count("looper"), 2);
}
