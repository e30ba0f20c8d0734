//! Ledger hot-path benchmarks.
//!
//! Measures one gathering-pass create/destroy under the per-device lock, and
//! the same cycle with several threads contending for one ledger.

use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use vksc_core::handle::{ObjectKind, RawHandle};
use vksc_core::info::{ImageSubresourceRange, ImageViewCreateInfo, RenderPassCreateInfo};
use vksc_membrane::{DeviceLedger, EventKind, Metric, ProcessMode};

fn view(layers: u32) -> ImageViewCreateInfo {
    ImageViewCreateInfo {
        subresource_range: ImageSubresourceRange {
            level_count: 1,
            layer_count: layers,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn cycle(ledger: &DeviceLedger, counter: &AtomicU64, info: &ImageViewCreateInfo) {
    let handle = {
        let mut state = ledger.lock();
        state.stats.record_create(Metric::ImageViewRequestCount, 1);
        state.stats.raise_max(
            Metric::MaxImageViewArrayLayers,
            u64::from(info.subresource_range.layer_count),
        );
        let handle = state
            .shadows
            .create_shadow(|| counter.fetch_add(1, Ordering::Relaxed) + 1, info.clone());
        state.note(EventKind::Create, ObjectKind::ImageView, handle.as_raw());
        handle
    };
    let mut state = ledger.lock();
    if state.shadows.destroy_shadow::<ImageViewCreateInfo>(handle).is_some() {
        state.stats.record_destroy(Metric::ImageViewRequestCount, 1);
    }
    state.note(EventKind::Destroy, ObjectKind::ImageView, handle.as_raw());
}

fn bench_create_destroy(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_create_destroy");
    group.throughput(Throughput::Elements(1));

    let ledger = DeviceLedger::new(ProcessMode::Gathering);
    let counter = AtomicU64::new(0);
    let info = view(4);
    group.bench_function("image_view", |b| {
        b.iter(|| cycle(black_box(&ledger), &counter, black_box(&info)));
    });

    let render_pass = RenderPassCreateInfo {
        subpasses: vec![Default::default(); 3],
        attachments: vec![Default::default(); 5],
        ..Default::default()
    };
    group.bench_function("render_pass_hashed", |b| {
        b.iter(|| {
            let mut state = ledger.lock();
            let handle = state.shadows.create_shadow(
                || counter.fetch_add(1, Ordering::Relaxed) + 1,
                black_box(&render_pass).clone(),
            );
            state.shadows.destroy_shadow::<RenderPassCreateInfo>(handle);
        });
    });
    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_contended");
    const OPS_PER_THREAD: u64 = 256;

    for threads in [1_u64, 2, 4, 8] {
        group.throughput(Throughput::Elements(threads * OPS_PER_THREAD));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &n| {
            let ledger = DeviceLedger::new(ProcessMode::Gathering);
            let counter = AtomicU64::new(0);
            let info = view(1);
            b.iter(|| {
                std::thread::scope(|s| {
                    for _ in 0..n {
                        s.spawn(|| {
                            for _ in 0..OPS_PER_THREAD {
                                cycle(&ledger, &counter, &info);
                            }
                        });
                    }
                });
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_create_destroy, bench_contended);
criterion_main!(benches);
