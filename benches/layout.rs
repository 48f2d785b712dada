extern crate smfkit;

use criterion::{criterion_group, criterion_main, Criterion};
use smfkit::{
    format::{
        extraheader::{ExtraHeaderChain, VEGETATION_TAG},
        layout::recalculate,
        tiles::TileTable,
    },
    Dimensions, MapDocument,
};
use std::{hint::black_box, io::Cursor};

/// Offset allocation for a large map with vegetation and many tile files
fn bench_recalculate(c: &mut Criterion) {
    let dimensions = Dimensions::new(32, 32).unwrap();
    let mut chain = ExtraHeaderChain::new();
    chain.find_or_create(VEGETATION_TAG);
    let mut tiles = TileTable::new();
    for i in 0..64 {
        tiles.push(format!("tiles/atlas_{i:03}.smt"), 4096).unwrap();
    }

    c.bench_function("recalculate_32x32", |b| {
        b.iter(|| black_box(recalculate(black_box(dimensions), &chain, &tiles).unwrap()));
    });
}

/// Full in-memory save of a small map with synthesized sections
fn bench_save(c: &mut Criterion) {
    let mut document = MapDocument::create(4, 4).unwrap();
    document.enable_vegetation();

    let mut group = c.benchmark_group("save");
    group.sample_size(10);
    group.bench_function("save_4x4", |b| {
        b.iter(|| {
            let output = document.save_to(Cursor::new(Vec::new())).unwrap();
            black_box(output.into_inner().len())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_recalculate, bench_save);
criterion_main!(benches);
