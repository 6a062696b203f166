//! Composite containers: executive fan-out (mirror and merge modes),
//! fill-only-empty priority, early termination, the opt-in path.

mod common;

use common::{grid, LeafPass};
use xpipeline::extent::Extent;
use xpipeline::nodes::{CompositeSource, LeafProbe};
use xpipeline::{
    CompositeData, DatasetKind, PipelineBuilder, PipelineEvent, Region, UpdateRequest,
};

fn fan_out_event(outcome: &xpipeline::UpdateOutcome, node: &str) -> Option<(usize, usize)> {
    outcome.events.iter().find_map(|e| match e {
        PipelineEvent::FanOut {
            node: n,
            leaves_visited,
            leaves_total,
        } if n == node => Some((*leaves_visited, *leaves_total)),
        _ => None,
    })
}

#[test]
fn test_mirror_fan_out_preserves_container_structure() {
    let container = CompositeData::multi_block(vec![
        Some(grid(0, 4, 1.0)),
        None,
        Some(grid(5, 9, 2.0)),
    ]);
    let mut b = PipelineBuilder::new();
    b.add_node("source", Box::new(CompositeSource::new(container)))
        .unwrap();
    // Leaf-typed input, unspecified output kind: the executive visits each
    // leaf and mirrors the results back into the container shape.
    b.add_node(
        "pass",
        Box::new(LeafPass {
            kind: DatasetKind::Any,
        }),
    )
    .unwrap();
    b.connect("source", 0, "pass", 0).unwrap();
    let mut pipeline = b.build().unwrap();

    let outcome = pipeline.update("pass", 0).unwrap();
    assert_eq!(fan_out_event(&outcome, "pass"), Some((2, 2)));
    // One compute per leaf through the ordinary single-dataset path.
    assert_eq!(outcome.compute_count("pass"), 2);

    let output = pipeline.output("pass", 0).unwrap().unwrap();
    let out = output.as_composite().unwrap();
    match out {
        CompositeData::MultiBlock { blocks } => {
            assert_eq!(blocks.len(), 3);
            assert!(blocks[0].is_some());
            assert!(blocks[1].is_none());
            assert!(blocks[2].is_some());
        }
        _ => panic!("mirrored output must stay a multi-block"),
    }
    let first = out.leaves()[0].data.as_structured().unwrap();
    assert_eq!(first.value("v", [2, 0, 0]), Some(1.0));
}

#[test]
fn test_merge_fan_out_is_fill_only_empty() {
    // Level 0 (coarse) covers [0,9] with 20s; level 1 (fine) covers [0,4]
    // with 10s. The fine leaf has priority over the overlap.
    let container = CompositeData::hierarchical(vec![
        vec![Some(grid(0, 9, 20.0))],
        vec![Some(grid(0, 4, 10.0))],
    ]);
    let mut b = PipelineBuilder::new();
    b.add_node("source", Box::new(CompositeSource::new(container)))
        .unwrap();
    b.add_node(
        "flatten",
        Box::new(LeafPass {
            kind: DatasetKind::Structured,
        }),
    )
    .unwrap();
    b.connect("source", 0, "flatten", 0).unwrap();
    let mut pipeline = b.build().unwrap();

    let outcome = pipeline.update("flatten", 0).unwrap();
    assert_eq!(fan_out_event(&outcome, "flatten"), Some((2, 2)));

    let output = pipeline.output("flatten", 0).unwrap().unwrap();
    let d = output.as_structured().unwrap();
    assert_eq!(*d.extent(), Extent::line(0, 9));
    assert!(d.fully_resolved());
    // Overlapping locations hold the finer leaf's value, never the
    // coarser one's.
    for x in 0..=4 {
        assert_eq!(d.value("v", [x, 0, 0]), Some(10.0));
    }
    for x in 5..=9 {
        assert_eq!(d.value("v", [x, 0, 0]), Some(20.0));
    }
}

#[test]
fn test_merge_fan_out_skips_leaves_once_resolved() {
    // The first leaf already covers the whole requested region; the
    // second is never visited.
    let container = CompositeData::multi_block(vec![
        Some(grid(0, 9, 1.0)),
        Some(grid(0, 9, 2.0)),
    ]);
    let mut b = PipelineBuilder::new();
    b.add_node("source", Box::new(CompositeSource::new(container)))
        .unwrap();
    b.add_node(
        "flatten",
        Box::new(LeafPass {
            kind: DatasetKind::Structured,
        }),
    )
    .unwrap();
    b.connect("source", 0, "flatten", 0).unwrap();
    let mut pipeline = b.build().unwrap();

    let outcome = pipeline.update("flatten", 0).unwrap();
    assert_eq!(fan_out_event(&outcome, "flatten"), Some((1, 2)));
    assert_eq!(outcome.compute_count("flatten"), 1);

    let output = pipeline.output("flatten", 0).unwrap().unwrap();
    let d = output.as_structured().unwrap();
    assert_eq!(d.value("v", [5, 0, 0]), Some(1.0));
}

#[test]
fn test_composite_aware_node_receives_the_container_whole() {
    let container = CompositeData::hierarchical(vec![
        vec![Some(grid(0, 9, 20.0))],
        vec![Some(grid(0, 4, 10.0))],
    ]);
    let mut b = PipelineBuilder::new();
    b.add_node("source", Box::new(CompositeSource::new(container)))
        .unwrap();
    b.add_node("probe", Box::new(LeafProbe)).unwrap();
    b.connect("source", 0, "probe", 0).unwrap();
    let mut pipeline = b.build().unwrap();

    let outcome = pipeline.update("probe", 0).unwrap();
    // Opt-in: no executive fan-out, a single compute sees the container.
    assert_eq!(fan_out_event(&outcome, "probe"), None);
    assert_eq!(outcome.compute_count("probe"), 1);

    let output = pipeline.output("probe", 0).unwrap().unwrap();
    let d = output.as_structured().unwrap();
    assert_eq!(d.value("v", [2, 0, 0]), Some(10.0));
    assert_eq!(d.value("v", [7, 0, 0]), Some(20.0));
}

#[test]
fn test_empty_composite_yields_an_unresolved_result() {
    let container = CompositeData::multi_block(vec![None, None]);
    let mut b = PipelineBuilder::new();
    b.add_node("source", Box::new(CompositeSource::new(container)))
        .unwrap();
    b.add_node("probe", Box::new(LeafProbe)).unwrap();
    b.connect("source", 0, "probe", 0).unwrap();
    let mut pipeline = b.build().unwrap();

    // An empty container has no bounds, so the caller names the region.
    pipeline
        .update_request(
            "probe",
            0,
            UpdateRequest::region(Region::Extent(Extent::line(0, 9))),
        )
        .unwrap();

    let output = pipeline.output("probe", 0).unwrap().unwrap();
    let d = output.as_structured().unwrap();
    assert_eq!(d.num_resolved(), 0);
}
