use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mobility::compute::sync::synchronize;
use mobility::{
    BoundingBox, BoxOctree, IndexConfig, Interpolation, Relation, TInstant, TSequence, Temporal,
    Timestamp, Value, ValueKind,
};

/// Deterministic pseudo-random boxes scattered over a 1000 x 1000 plane.
fn scattered_boxes(n: usize) -> Vec<(usize, BoundingBox)> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 10_000) as f64 / 10.0
    };
    (0..n)
        .map(|i| {
            let (x, y) = (next(), next());
            let (w, h) = (next() / 100.0, next() / 100.0);
            (i, BoundingBox::new().with_xy(x, y, x + w, y + h))
        })
        .collect()
}

fn ramp(n: usize, offset: f64) -> Temporal {
    let instants = (0..n)
        .map(|i| {
            let v = ((i as f64) * 0.1 + offset).sin() * 100.0;
            TInstant::new(Value::Float(v), Timestamp::from_secs(i as i64 * 10)).unwrap()
        })
        .collect();
    Temporal::Sequence(TSequence::new(instants, true, true, Interpolation::Linear).unwrap())
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("octree_build");

    for size in [1_000, 10_000, 50_000].iter() {
        let entries = scattered_boxes(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("leaf_capacity_1", size), &entries, |b, entries| {
            b.iter(|| BoxOctree::build(black_box(entries.clone()), &IndexConfig::default()).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("leaf_capacity_16", size), &entries, |b, entries| {
            let config = IndexConfig {
                leaf_capacity: 16,
                ..IndexConfig::default()
            };
            b.iter(|| BoxOctree::build(black_box(entries.clone()), &config).unwrap())
        });
    }

    group.finish();
}

fn benchmark_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("octree_query");

    let tree = BoxOctree::build(scattered_boxes(50_000), &IndexConfig::default()).unwrap();
    let small = BoundingBox::new().with_xy(400.0, 400.0, 410.0, 410.0);
    let large = BoundingBox::new().with_xy(100.0, 100.0, 600.0, 600.0);

    group.bench_function("overlaps_small_window", |b| {
        b.iter(|| tree.search(Relation::Overlaps, black_box(&small)).unwrap().len())
    });

    group.bench_function("overlaps_large_window", |b| {
        b.iter(|| tree.search(Relation::Overlaps, black_box(&large)).unwrap().len())
    });

    group.bench_function("contained_by_large_window", |b| {
        b.iter(|| tree.search(Relation::ContainedBy, black_box(&large)).unwrap().len())
    });

    let strip = BoundingBox::new().with_x(50.0, 50.0);
    group.bench_function("left_of_strip", |b| {
        b.iter(|| tree.search(Relation::Left, black_box(&strip)).unwrap().len())
    });

    group.finish();
}

fn benchmark_temporal_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("temporal_operations");

    for size in [100, 1_000, 10_000].iter() {
        let a = ramp(*size, 0.0);
        let b = ramp(*size, 1.5);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("synchronize", size), size, |bench, _| {
            bench.iter(|| synchronize(black_box(&a), black_box(&b), false).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("synchronize_crossings", size), size, |bench, _| {
            bench.iter(|| synchronize(black_box(&a), black_box(&b), true).unwrap())
        });

        let text = a.to_string();
        group.bench_with_input(BenchmarkId::new("parse_text", size), size, |bench, _| {
            bench.iter(|| Temporal::parse(black_box(&text), ValueKind::Float).unwrap())
        });

        let wire = a.to_wire().unwrap();
        group.bench_with_input(BenchmarkId::new("decode_wire", size), size, |bench, _| {
            bench.iter(|| Temporal::from_wire(black_box(&wire)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_build,
    benchmark_query,
    benchmark_temporal_operations
);

criterion_main!(benches);
