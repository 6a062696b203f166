use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use xpipeline::extent::Extent;
use xpipeline::nodes::{BoxSmooth, PassThrough, RampSource};
use xpipeline::{Pipeline, PipelineBuilder};

fn make_pipeline(points: i64) -> Pipeline {
    let mut b = PipelineBuilder::new();
    b.add_node("source", Box::new(RampSource::new(Extent::line(0, points - 1))))
        .unwrap();
    b.add_node("smooth", Box::new(BoxSmooth::new(1))).unwrap();
    b.add_node("sink", Box::new(PassThrough)).unwrap();
    b.connect("source", 0, "smooth", 0).unwrap();
    b.connect("smooth", 0, "sink", 0).unwrap();
    b.build().unwrap()
}

fn bench_update(c: &mut Criterion) {
    c.bench_function("update_cached", |b| {
        let mut pipeline = make_pipeline(1_000);
        pipeline.update("sink", 0).unwrap();
        b.iter(|| {
            let outcome = pipeline.update(black_box("sink"), 0).unwrap();
            black_box(outcome);
        });
    });

    let mut group = c.benchmark_group("update_cold");
    for points in [100i64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(points), &points, |b, &points| {
            let mut pipeline = make_pipeline(points);
            b.iter(|| {
                // Re-dirty the source so every iteration renegotiates and
                // recomputes the full chain.
                pipeline.mark_modified("source").unwrap();
                let outcome = pipeline.update(black_box("sink"), 0).unwrap();
                black_box(outcome);
            });
        });
    }
    group.finish();

    c.bench_function("update_piece_of_four", |b| {
        let mut pipeline = make_pipeline(10_000);
        let mut piece = 0u32;
        b.iter(|| {
            pipeline.mark_modified("source").unwrap();
            let outcome = pipeline
                .update_piece(black_box("sink"), 0, piece, 4, 1)
                .unwrap();
            piece = (piece + 1) % 4;
            black_box(outcome);
        });
    });
}

criterion_group!(benches, bench_update);
criterion_main!(benches);
