use std::sync::atomic::{AtomicU64, Ordering};

use vksc_core::handle::{
    CommandBuffer, CommandPool, DescriptorSetLayout, Device, ImageView, Pipeline, PipelineCache,
    PipelineLayout, QueryPool, RenderPass, Sampler, SamplerYcbcrConversion,
    ShaderModule,
};
use vksc_core::info::{
    AttachmentDescription, CommandBufferAllocateInfo, CommandBufferLevel, CommandPoolCreateInfo,
    ComputePipelineCreateInfo, DescriptorSetLayoutCreateInfo, DescriptorSetLayoutSupport,
    GraphicsPipelineCreateInfo, ImageViewCreateInfo, PipelineLayoutCreateInfo,
    QueryPoolCreateInfo, RenderPassCreateInfo, RenderPassCreateInfo2, SamplerCreateInfo,
    SamplerYcbcrConversionCreateInfo, ShaderModuleCreateInfo, SubpassDescription,
};
use vksc_core::{DeviceInterface, DriverError, DriverResult, VkResult};
use vksc_driver::DeviceDriverSc;
use vksc_membrane::{
    CommandBufferRecord, EventKind, Metric, MetricTable, ProcessMode, StandardResources,
    StatisticsSnapshot,
};

const DEVICE: Device = Device::from_raw(0xD0);

#[derive(Clone, Copy, Debug)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn gen_range_usize(&mut self, low: usize, high_inclusive: usize) -> usize {
        assert!(low <= high_inclusive);
        let span = high_inclusive - low + 1;
        low + (self.next_u64() as usize % span)
    }
}

/// Driver that counts every call it receives. The gathering pass must never reach it.
#[derive(Default)]
struct CountingDriver {
    calls: AtomicU64,
}

impl CountingDriver {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

macro_rules! counted {
    (create $name:ident($($arg:ty),*) -> $ret:ty) => {
        fn $name(&self, $(_: $arg),*) -> DriverResult<$ret> {
            self.hit();
            Err(DriverError::Vk(VkResult::ERROR_INITIALIZATION_FAILED))
        }
    };
    (destroy $name:ident($($arg:ty),*)) => {
        fn $name(&self, $(_: $arg),*) {
            self.hit();
        }
    };
}

impl DeviceInterface for CountingDriver {
    counted!(destroy destroy_device(Device));
    counted!(create create_descriptor_set_layout(Device, &DescriptorSetLayoutCreateInfo) -> DescriptorSetLayout);
    counted!(destroy destroy_descriptor_set_layout(Device, DescriptorSetLayout));
    counted!(create get_descriptor_set_layout_support(Device, &DescriptorSetLayoutCreateInfo) -> DescriptorSetLayoutSupport);
    counted!(create create_image_view(Device, &ImageViewCreateInfo) -> ImageView);
    counted!(destroy destroy_image_view(Device, ImageView));
    counted!(create create_query_pool(Device, &QueryPoolCreateInfo) -> QueryPool);
    counted!(destroy destroy_query_pool(Device, QueryPool));
    counted!(create create_pipeline_layout(Device, &PipelineLayoutCreateInfo) -> PipelineLayout);
    counted!(destroy destroy_pipeline_layout(Device, PipelineLayout));
    counted!(create create_graphics_pipelines(Device, PipelineCache, &[GraphicsPipelineCreateInfo]) -> Vec<Pipeline>);
    counted!(create create_compute_pipelines(Device, PipelineCache, &[ComputePipelineCreateInfo]) -> Vec<Pipeline>);
    counted!(destroy destroy_pipeline(Device, Pipeline));
    counted!(create create_render_pass(Device, &RenderPassCreateInfo) -> RenderPass);
    counted!(create create_render_pass2(Device, &RenderPassCreateInfo2) -> RenderPass);
    counted!(destroy destroy_render_pass(Device, RenderPass));
    counted!(create create_sampler(Device, &SamplerCreateInfo) -> Sampler);
    counted!(destroy destroy_sampler(Device, Sampler));
    counted!(create create_sampler_ycbcr_conversion(Device, &SamplerYcbcrConversionCreateInfo) -> SamplerYcbcrConversion);
    counted!(destroy destroy_sampler_ycbcr_conversion(Device, SamplerYcbcrConversion));
    counted!(create create_shader_module(Device, &ShaderModuleCreateInfo) -> ShaderModule);
    counted!(destroy destroy_shader_module(Device, ShaderModule));
    counted!(create create_command_pool(Device, &CommandPoolCreateInfo) -> CommandPool);
    counted!(create reset_command_pool(Device, CommandPool, u32) -> ());
    counted!(destroy destroy_command_pool(Device, CommandPool));
    counted!(create allocate_command_buffers(Device, &CommandBufferAllocateInfo) -> Vec<CommandBuffer>);
    counted!(destroy free_command_buffers(Device, CommandPool, &[CommandBuffer]));
}

fn view(layers: u32) -> ImageViewCreateInfo {
    let mut info = ImageViewCreateInfo::default();
    info.subresource_range.level_count = 1;
    info.subresource_range.layer_count = layers;
    info
}

fn render_pass(subpasses: usize, attachments: usize) -> RenderPassCreateInfo {
    RenderPassCreateInfo {
        flags: 0,
        attachments: vec![AttachmentDescription::default(); attachments],
        subpasses: vec![SubpassDescription::default(); subpasses],
        dependencies: Vec::new(),
    }
}

/// What the device should be tracking, kept independently of the router.
#[derive(Default)]
struct Model {
    views: Vec<(ImageView, bool)>,
    render_passes: Vec<(RenderPass, u64, u64)>,
    pools: Vec<CommandPool>,
    buffers: Vec<(CommandBuffer, CommandPool)>,
    dead: Vec<u64>,
}

impl Model {
    fn expected(&self) -> Vec<(Metric, u64)> {
        let n = |len: usize| len as u64;
        vec![
            (Metric::ImageViewRequestCount, n(self.views.len())),
            (
                Metric::LayeredImageViewRequestCount,
                n(self.views.iter().filter(|(_, layered)| *layered).count()),
            ),
            (Metric::RenderPassRequestCount, n(self.render_passes.len())),
            (
                Metric::SubpassDescriptionRequestCount,
                self.render_passes.iter().map(|(_, s, _)| s).sum::<u64>(),
            ),
            (
                Metric::AttachmentDescriptionRequestCount,
                self.render_passes.iter().map(|(_, _, a)| a).sum::<u64>(),
            ),
            (Metric::CommandPoolRequestCount, n(self.pools.len())),
            (Metric::CommandBufferRequestCount, n(self.buffers.len())),
        ]
    }
}

fn assert_tracks(dev: &DeviceDriverSc<'_, CountingDriver>, model: &Model, last_max: &MetricTable, ctx: &str) {
    let snap = dev.statistics();
    for (metric, expected) in model.expected() {
        assert_eq!(snap.current.get(metric), expected, "{ctx}: {metric}");
    }
    for metric in Metric::ALL.iter().copied() {
        assert!(snap.max.get(metric) >= snap.current.get(metric), "{ctx}: {metric} max below current");
        assert!(snap.max.get(metric) >= last_max.get(metric), "{ctx}: {metric} max decreased");
    }
}

fn destroy_stray(dev: &DeviceDriverSc<'_, CountingDriver>, kind: usize, raw: u64) {
    match kind {
        0 => dev.destroy_image_view(DEVICE, ImageView::from_raw(raw)),
        1 => dev.destroy_render_pass(DEVICE, RenderPass::from_raw(raw)),
        2 => dev.destroy_command_pool(DEVICE, CommandPool::from_raw(raw)),
        _ => dev.free_command_buffers(DEVICE, CommandPool::null(), &[CommandBuffer::from_raw(raw)]),
    }
}

#[test]
fn deterministic_sequences_hold_counting_invariants() {
    const SEEDS: [u64; 4] = [1, 2, 3, 4];
    const STEPS: usize = 1_500;

    for seed in SEEDS {
        let res = StandardResources::new(ProcessMode::Gathering);
        let dev = DeviceDriverSc::new(CountingDriver::default(), DEVICE, &res);
        let mut rng = XorShift64::new(seed);
        let mut model = Model::default();
        let mut last_handle = 0_u64;
        let mut last_max = StatisticsSnapshot::default().max;

        for step in 0..STEPS {
            let ctx = format!("seed={seed} step={step}");
            let mut created: Vec<u64> = Vec::new();
            match rng.gen_range_usize(0, 99) {
                0..=17 => {
                    let layered = rng.gen_range_usize(0, 3) == 0;
                    let handle = dev
                        .create_image_view(DEVICE, &view(if layered { 4 } else { 1 }))
                        .unwrap();
                    created.push(handle.as_raw());
                    model.views.push((handle, layered));
                }
                18..=29 => {
                    let subpasses = rng.gen_range_usize(1, 4);
                    let attachments = rng.gen_range_usize(0, 5);
                    let handle = dev
                        .create_render_pass(DEVICE, &render_pass(subpasses, attachments))
                        .unwrap();
                    created.push(handle.as_raw());
                    model
                        .render_passes
                        .push((handle, subpasses as u64, attachments as u64));
                }
                30..=37 => {
                    let pool = dev
                        .create_command_pool(DEVICE, &CommandPoolCreateInfo::default())
                        .unwrap();
                    created.push(pool.as_raw());
                    model.pools.push(pool);
                }
                38..=51 => {
                    if model.pools.is_empty() {
                        continue;
                    }
                    let pool = model.pools[rng.gen_range_usize(0, model.pools.len() - 1)];
                    let count = rng.gen_range_usize(1, 4) as u32;
                    let info = CommandBufferAllocateInfo {
                        command_pool: pool,
                        level: CommandBufferLevel::PRIMARY,
                        command_buffer_count: count,
                    };
                    let buffers = dev.allocate_command_buffers(DEVICE, &info).unwrap();
                    assert_eq!(buffers.len(), count as usize, "{ctx}");
                    for buffer in buffers {
                        created.push(buffer.as_raw());
                        model.buffers.push((buffer, pool));
                    }
                }
                52..=61 => {
                    if model.views.is_empty() {
                        continue;
                    }
                    let idx = rng.gen_range_usize(0, model.views.len() - 1);
                    let (handle, _) = model.views.swap_remove(idx);
                    dev.destroy_image_view(DEVICE, handle);
                    model.dead.push(handle.as_raw());
                }
                62..=69 => {
                    if model.render_passes.is_empty() {
                        continue;
                    }
                    let idx = rng.gen_range_usize(0, model.render_passes.len() - 1);
                    let (handle, _, _) = model.render_passes.swap_remove(idx);
                    dev.destroy_render_pass(DEVICE, handle);
                    model.dead.push(handle.as_raw());
                }
                70..=79 => {
                    if model.buffers.is_empty() {
                        continue;
                    }
                    // A batch of live buffers with a null entry mixed in.
                    let mut batch = vec![CommandBuffer::null()];
                    for _ in 0..rng.gen_range_usize(1, 3) {
                        if model.buffers.is_empty() {
                            break;
                        }
                        let idx = rng.gen_range_usize(0, model.buffers.len() - 1);
                        let (buffer, _) = model.buffers.swap_remove(idx);
                        batch.push(buffer);
                        model.dead.push(buffer.as_raw());
                    }
                    dev.free_command_buffers(DEVICE, CommandPool::null(), &batch);
                }
                80..=85 => {
                    if model.pools.is_empty() {
                        continue;
                    }
                    let idx = rng.gen_range_usize(0, model.pools.len() - 1);
                    let pool = model.pools.swap_remove(idx);
                    dev.destroy_command_pool(DEVICE, pool);
                    // Buffers allocated from the pool go with it.
                    for (buffer, _) in model.buffers.iter().filter(|(_, p)| *p == pool) {
                        model.dead.push(buffer.as_raw());
                    }
                    model.buffers.retain(|(_, p)| *p != pool);
                    model.dead.push(pool.as_raw());
                }
                _ => {
                    // Double destroy or never-issued handle: nothing may move.
                    let before = dev.statistics();
                    let records = dev.ledger().lock().shadows.total_records();
                    let raw = if model.dead.is_empty() || rng.gen_range_usize(0, 1) == 0 {
                        u64::MAX - step as u64
                    } else {
                        model.dead[rng.gen_range_usize(0, model.dead.len() - 1)]
                    };
                    destroy_stray(&dev, rng.gen_range_usize(0, 3), raw);
                    assert_eq!(before, dev.statistics(), "{ctx}");
                    let state = dev.ledger().lock();
                    assert_eq!(state.shadows.total_records(), records, "{ctx}");
                    let last = state.events.iter().last().map(|e| e.kind);
                    assert_eq!(last, Some(EventKind::DestroyMiss), "{ctx}");
                }
            }

            for raw in created {
                assert!(raw > last_handle, "{ctx}: handles must increase");
                last_handle = raw;
            }
            assert_tracks(&dev, &model, &last_max, &ctx);
            last_max = dev.statistics().max;
        }

        let state = dev.ledger().lock();
        assert_eq!(state.shadows.count::<ImageViewCreateInfo>(), model.views.len());
        assert_eq!(state.shadows.count::<RenderPassCreateInfo>(), model.render_passes.len());
        assert_eq!(state.shadows.count::<CommandPoolCreateInfo>(), model.pools.len());
        assert_eq!(state.shadows.count::<CommandBufferRecord>(), model.buffers.len());
        drop(state);
        assert_eq!(res.counter(), last_handle);
        assert_eq!(dev.inner().calls.load(Ordering::SeqCst), 0, "seed={seed}");
    }
}
