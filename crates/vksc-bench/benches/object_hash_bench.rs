//! Object hash benchmarks over growing descriptors.

use std::collections::HashMap;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use vksc_core::handle::DescriptorSetLayout;
use vksc_core::info::{
    DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo, DescriptorType,
    PipelineLayoutCreateInfo,
};
use vksc_core::object_hash::{descriptor_set_layout_hash, pipeline_layout_hash};
use vksc_core::ObjectHash;

fn layout(bindings: u32) -> DescriptorSetLayoutCreateInfo {
    DescriptorSetLayoutCreateInfo {
        flags: 0,
        bindings: (0..bindings)
            .map(|binding| DescriptorSetLayoutBinding {
                binding,
                descriptor_type: DescriptorType::STORAGE_BUFFER,
                descriptor_count: 1,
                stage_flags: 0x20,
                immutable_samplers: Vec::new(),
            })
            .collect(),
    }
}

fn bench_set_layout_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("descriptor_set_layout_hash");
    let hashes: HashMap<u64, ObjectHash> = HashMap::new();
    for bindings in [1_u32, 8, 64, 512] {
        let info = layout(bindings);
        group.bench_with_input(BenchmarkId::from_parameter(bindings), &info, |b, info| {
            b.iter(|| descriptor_set_layout_hash(black_box(info), &hashes));
        });
    }
    group.finish();
}

fn bench_pipeline_layout_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_layout_hash");
    for sets in [1_u64, 4, 32] {
        let hashes: HashMap<u64, ObjectHash> =
            (1..=sets).map(|h| (h, ObjectHash(h.wrapping_mul(0x9E37_79B9)))).collect();
        let info = PipelineLayoutCreateInfo {
            set_layouts: (1..=sets).map(DescriptorSetLayout::from_raw).collect(),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(sets), &info, |b, info| {
            b.iter(|| pipeline_layout_hash(black_box(info), &hashes));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_set_layout_hash, bench_pipeline_layout_hash);
criterion_main!(benches);
