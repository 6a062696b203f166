use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use xpipeline::extent::Extent;
use xpipeline::{BlockTranslator, RegionTranslator};

fn bench_translator(c: &mut Criterion) {
    let mut group = c.benchmark_group("piece_to_extent");
    let whole = Extent::new([0, 0, 0], [511, 511, 127]);
    for num_pieces in [4u32, 64, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_pieces),
            &num_pieces,
            |b, &num_pieces| {
                let translator = BlockTranslator;
                b.iter(|| {
                    for piece in 0..num_pieces {
                        let e = translator.piece_to_extent(
                            black_box(piece),
                            num_pieces,
                            1,
                            &whole,
                        );
                        black_box(e);
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_translator);
criterion_main!(benches);
