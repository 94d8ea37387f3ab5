//! Benchmarks for the per-frame host path.
//!
//! Models a streaming trajectory: a long strip already on the device, a few
//! new points appended each frame, then one reconcile pass with mileage.
//! The cost should follow the batch size, not the strip length.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use line_strip_glow::LineStrip;

/// Existing strip lengths.
const LENGTHS: [usize; 3] = [1_000, 100_000, 1_000_000];

/// Points appended per frame.
const BATCH: usize = 16;

fn filled_strip(len: usize) -> LineStrip {
    let mut strip = LineStrip::new(len + 1024).expect("allocate strip");
    for (i, v) in strip.edit(0, len).expect("edit").iter_mut().enumerate() {
        v.x = i as f32;
        v.y = (i as f32 * 0.01).sin();
    }
    strip.reconcile(true, 1.0).expect("reconcile");
    strip
}

fn append_and_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_and_reconcile");
    for len in LENGTHS {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let mut strip = filled_strip(len);
            b.iter(|| {
                let base = strip.logical_size();
                for (i, v) in strip.edit_append(BATCH).expect("edit").iter_mut().enumerate() {
                    v.x = (base + i) as f32;
                    v.y = 0.0;
                }
                let snapshot = strip.reconcile(true, 1.0).expect("reconcile");
                black_box(snapshot.xy.dirty.covered_bytes());
            });
        });
    }
    group.finish();
}

fn overwrite_head(c: &mut Criterion) {
    let mut group = c.benchmark_group("overwrite_head");
    for len in LENGTHS {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let mut strip = filled_strip(len);
            b.iter(|| {
                strip.edit(0, 1).expect("edit")[0].y += 1.0;
                // Without mileage this stays local to the head.
                let snapshot = strip.reconcile(false, 1.0).expect("reconcile");
                black_box(snapshot.flags.dirty.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, append_and_reconcile, overwrite_head);
criterion_main!(benches);
