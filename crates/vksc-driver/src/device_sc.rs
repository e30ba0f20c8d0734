//! Device wrapper that routes tracked calls by process mode.
//!
//! In the gathering pass the purely synthetic kinds (image views, pipelines,
//! query pools, command pools and buffers) never reach the real driver: they
//! get a handle from the resource counter, a shadow record and statistics.
//! Layouts, render passes, samplers and Y'CbCr conversions are shadowed the
//! same way and additionally become hash-addressable. In the replay pass every
//! call reaches the real driver, statistics are untouched, and successful
//! layout/render-pass/sampler creations register their object hash.
//!
//! Each call takes the ledger lock once and holds it until it returns.

use vksc_core::handle::{
    CommandBuffer, CommandPool, DescriptorSetLayout, Device, ImageView, ObjectKind, Pipeline,
    PipelineCache, PipelineLayout, QueryPool, RawHandle, RenderPass, Sampler,
    SamplerYcbcrConversion, ShaderModule,
};
use vksc_core::info::{
    CommandBufferAllocateInfo, CommandPoolCreateInfo, ComputePipelineCreateInfo,
    DescriptorSetLayoutCreateInfo, DescriptorSetLayoutSupport, GraphicsPipelineCreateInfo,
    ImageViewCreateInfo, PipelineLayoutCreateInfo, QueryPoolCreateInfo, QueryType,
    RenderPassCreateInfo, RenderPassCreateInfo2, SamplerCreateInfo,
    SamplerYcbcrConversionCreateInfo, ShaderModuleCreateInfo,
};
use vksc_core::{DeviceInterface, DriverError, DriverResult};
use vksc_membrane::{
    CommandBufferRecord, DeviceLedger, EventKind, LedgerEvent, LedgerState, MembraneConfig,
    Metric, ProcessMode, ResourceInterface, ShadowKind, StatisticsSnapshot,
};

use crate::platform::DeviceDriver;

fn len64(n: usize) -> u64 {
    n as u64
}

/// Mode Router for one device.
///
/// The resource collaborator is borrowed for the wrapper's lifetime; dropping
/// the wrapper hands the final statistics back to it.
pub struct DeviceDriverSc<'r, D: DeviceInterface = DeviceDriver> {
    vk: D,
    device: Device,
    mode: ProcessMode,
    resources: &'r dyn ResourceInterface,
    ledger: DeviceLedger,
}

impl<'r, D: DeviceInterface> DeviceDriverSc<'r, D> {
    pub fn new(vk: D, device: Device, resources: &'r dyn ResourceInterface) -> Self {
        let config = MembraneConfig::with_mode(resources.process_mode());
        Self::with_config(vk, device, resources, &config)
    }

    /// Like [`new`](Self::new) with an explicit event-log capacity. The mode
    /// always comes from the collaborator.
    pub fn with_config(
        vk: D,
        device: Device,
        resources: &'r dyn ResourceInterface,
        config: &MembraneConfig,
    ) -> Self {
        let mode = resources.process_mode();
        resources.init_device(device);
        Self {
            vk,
            device,
            mode,
            resources,
            ledger: DeviceLedger::with_event_capacity(mode, config.event_log_capacity),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> ProcessMode {
        self.mode
    }

    #[must_use]
    pub const fn device(&self) -> Device {
        self.device
    }

    #[must_use]
    pub const fn inner(&self) -> &D {
        &self.vk
    }

    #[must_use]
    pub fn resources(&self) -> &'r dyn ResourceInterface {
        self.resources
    }

    #[must_use]
    pub const fn ledger(&self) -> &DeviceLedger {
        &self.ledger
    }

    /// Statistics as of the last completed call.
    #[must_use]
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.ledger.snapshot()
    }

    #[must_use]
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.ledger.events()
    }

    /// Clear the shadow registry between independent recreation passes.
    /// Statistics and the collaborator's handle counter are left alone.
    pub fn reset(&self) {
        self.ledger.reset();
    }

    /// Account one recorded command against `command_buffer`. Gathering only.
    pub fn increase_command_buffer_size(
        &self,
        command_buffer: CommandBuffer,
        function_name: &str,
    ) -> DriverResult<()> {
        if self.mode.is_replaying() {
            return Err(DriverError::WrongMode {
                operation: "increase_command_buffer_size",
                mode: self.mode.as_str(),
            });
        }
        let _state = self.ledger.lock();
        self.resources
            .increase_command_buffer_size(command_buffer, function_name);
        Ok(())
    }

    fn shadow<K: ShadowKind>(&self, state: &mut LedgerState, info: K) -> K::Handle {
        let handle = state
            .shadows
            .create_shadow(|| self.resources.inc_resource_counter(), info);
        state.note(EventKind::Create, <K::Handle as RawHandle>::KIND, handle.as_raw());
        handle
    }

    fn forwarded<H: RawHandle>(&self, handle: H) {
        self.ledger
            .lock()
            .note(EventKind::Forward, H::KIND, handle.as_raw());
    }

    /// Replay-pass creation of a hash-addressable kind.
    fn forward_hashed<K: ShadowKind>(&self, created: DriverResult<K::Handle>, info: &K) -> DriverResult<K::Handle> {
        let handle = created?;
        let mut state = self.ledger.lock();
        state.shadows.register_object_hash(handle, info);
        state.note(EventKind::Forward, <K::Handle as RawHandle>::KIND, handle.as_raw());
        Ok(handle)
    }
}

fn untrack<K: ShadowKind>(state: &mut LedgerState, handle: K::Handle) -> Option<K> {
    state.shadows.destroy_shadow::<K>(handle)
}

fn note_destroy(state: &mut LedgerState, hit: bool, kind: ObjectKind, raw: u64) {
    let event = if hit { EventKind::Destroy } else { EventKind::DestroyMiss };
    state.note(event, kind, raw);
}

impl<D: DeviceInterface> Drop for DeviceDriverSc<'_, D> {
    fn drop(&mut self) {
        self.resources
            .deinit_device(self.device, &self.ledger.snapshot());
    }
}

impl<D: DeviceInterface> DeviceInterface for DeviceDriverSc<'_, D> {
    fn destroy_device(&self, device: Device) {
        match self.mode {
            ProcessMode::Gathering => {
                let mut state = self.ledger.lock();
                self.resources.unregister_device_features(device);
                state.note(EventKind::Destroy, ObjectKind::Device, device.as_raw());
            }
            ProcessMode::Replaying => {
                self.vk.destroy_device(device);
                self.forwarded(device);
            }
        }
    }

    fn create_descriptor_set_layout(
        &self,
        device: Device,
        info: &DescriptorSetLayoutCreateInfo,
    ) -> DriverResult<DescriptorSetLayout> {
        if self.mode.is_replaying() {
            return self.forward_hashed(self.vk.create_descriptor_set_layout(device, info), info);
        }
        let mut state = self.ledger.lock();
        let stats = &mut state.stats;
        stats.record_create(Metric::DescriptorSetLayoutRequestCount, 1);
        stats.record_create(
            Metric::DescriptorSetLayoutBindingRequestCount,
            len64(info.bindings.len()),
        );
        let mut immutable_samplers = 0_u64;
        for binding in &info.bindings {
            stats.raise_max(
                Metric::DescriptorSetLayoutBindingLimit,
                u64::from(binding.binding) + 1,
            );
            if binding.has_immutable_samplers() {
                immutable_samplers += u64::from(binding.descriptor_count);
            }
        }
        stats.raise_max(
            Metric::MaxImmutableSamplersPerDescriptorSetLayout,
            immutable_samplers,
        );
        let layout = self.shadow(&mut state, info.clone());
        self.resources
            .record_descriptor_set_layout(device, layout, info);
        Ok(layout)
    }

    fn destroy_descriptor_set_layout(&self, device: Device, layout: DescriptorSetLayout) {
        if self.mode.is_replaying() {
            self.vk.destroy_descriptor_set_layout(device, layout);
            return self.forwarded(layout);
        }
        let mut state = self.ledger.lock();
        let removed = untrack::<DescriptorSetLayoutCreateInfo>(&mut state, layout);
        if let Some(info) = &removed {
            state
                .stats
                .record_destroy(Metric::DescriptorSetLayoutRequestCount, 1);
            state.stats.record_destroy(
                Metric::DescriptorSetLayoutBindingRequestCount,
                len64(info.bindings.len()),
            );
        }
        note_destroy(&mut state, removed.is_some(), ObjectKind::DescriptorSetLayout, layout.as_raw());
    }

    fn get_descriptor_set_layout_support(
        &self,
        device: Device,
        info: &DescriptorSetLayoutCreateInfo,
    ) -> DriverResult<DescriptorSetLayoutSupport> {
        if self.mode.is_replaying() {
            return self.vk.get_descriptor_set_layout_support(device, info);
        }
        let mut state = self.ledger.lock();
        for binding in &info.bindings {
            state.stats.raise_max(
                Metric::DescriptorSetLayoutBindingLimit,
                u64::from(binding.binding) + 1,
            );
        }
        Ok(DescriptorSetLayoutSupport { supported: true })
    }

    fn create_image_view(&self, device: Device, info: &ImageViewCreateInfo) -> DriverResult<ImageView> {
        if self.mode.is_replaying() {
            let view = self.vk.create_image_view(device, info)?;
            self.forwarded(view);
            return Ok(view);
        }
        let range = &info.subresource_range;
        let mut state = self.ledger.lock();
        let stats = &mut state.stats;
        stats.record_create(Metric::ImageViewRequestCount, 1);
        stats.raise_max(Metric::MaxImageViewMipLevels, u64::from(range.level_count));
        stats.raise_max(Metric::MaxImageViewArrayLayers, u64::from(range.layer_count));
        if info.is_layered() {
            stats.record_create(Metric::LayeredImageViewRequestCount, 1);
            stats.raise_max(
                Metric::MaxLayeredImageViewMipLevels,
                u64::from(range.level_count),
            );
        }
        Ok(self.shadow(&mut state, info.clone()))
    }

    fn destroy_image_view(&self, device: Device, view: ImageView) {
        if self.mode.is_replaying() {
            self.vk.destroy_image_view(device, view);
            return self.forwarded(view);
        }
        let mut state = self.ledger.lock();
        let removed = untrack::<ImageViewCreateInfo>(&mut state, view);
        if let Some(info) = &removed {
            state.stats.record_destroy(Metric::ImageViewRequestCount, 1);
            if info.is_layered() {
                state
                    .stats
                    .record_destroy(Metric::LayeredImageViewRequestCount, 1);
            }
        }
        note_destroy(&mut state, removed.is_some(), ObjectKind::ImageView, view.as_raw());
    }

    fn create_query_pool(&self, device: Device, info: &QueryPoolCreateInfo) -> DriverResult<QueryPool> {
        if self.mode.is_replaying() {
            let pool = self.vk.create_query_pool(device, info)?;
            self.forwarded(pool);
            return Ok(pool);
        }
        let mut state = self.ledger.lock();
        state.stats.record_create(Metric::QueryPoolRequestCount, 1);
        let per_pool = match info.query_type {
            QueryType::OCCLUSION => Some(Metric::MaxOcclusionQueriesPerPool),
            QueryType::PIPELINE_STATISTICS => Some(Metric::MaxPipelineStatisticsQueriesPerPool),
            QueryType::TIMESTAMP => Some(Metric::MaxTimestampQueriesPerPool),
            _ => None,
        };
        if let Some(metric) = per_pool {
            state.stats.raise_max(metric, u64::from(info.query_count));
        }
        Ok(self.shadow(&mut state, info.clone()))
    }

    /// Query pools are never reclaimed, so in the gathering pass the record
    /// and its request count stay.
    fn destroy_query_pool(&self, device: Device, pool: QueryPool) {
        if self.mode.is_replaying() {
            self.vk.destroy_query_pool(device, pool);
            return self.forwarded(pool);
        }
        let mut state = self.ledger.lock();
        if !state.shadows.contains::<QueryPoolCreateInfo>(pool) {
            state.note(EventKind::DestroyMiss, ObjectKind::QueryPool, pool.as_raw());
        }
    }

    fn create_pipeline_layout(
        &self,
        device: Device,
        info: &PipelineLayoutCreateInfo,
    ) -> DriverResult<PipelineLayout> {
        if self.mode.is_replaying() {
            return self.forward_hashed(self.vk.create_pipeline_layout(device, info), info);
        }
        let mut state = self.ledger.lock();
        state
            .stats
            .record_create(Metric::PipelineLayoutRequestCount, 1);
        let layout = self.shadow(&mut state, info.clone());
        self.resources.record_pipeline_layout(device, layout, info);
        Ok(layout)
    }

    fn destroy_pipeline_layout(&self, device: Device, layout: PipelineLayout) {
        if self.mode.is_replaying() {
            self.vk.destroy_pipeline_layout(device, layout);
            return self.forwarded(layout);
        }
        let mut state = self.ledger.lock();
        let hit = untrack::<PipelineLayoutCreateInfo>(&mut state, layout).is_some();
        if hit {
            state
                .stats
                .record_destroy(Metric::PipelineLayoutRequestCount, 1);
        }
        note_destroy(&mut state, hit, ObjectKind::PipelineLayout, layout.as_raw());
    }

    fn create_graphics_pipelines(
        &self,
        device: Device,
        cache: PipelineCache,
        infos: &[GraphicsPipelineCreateInfo],
    ) -> DriverResult<Vec<Pipeline>> {
        if self.mode.is_replaying() {
            let pipelines = self
                .resources
                .create_graphics_pipelines(&self.vk, device, cache, infos)?;
            let mut state = self.ledger.lock();
            for pipeline in &pipelines {
                state.note(EventKind::Forward, ObjectKind::Pipeline, pipeline.as_raw());
            }
            return Ok(pipelines);
        }
        let mut state = self.ledger.lock();
        state
            .stats
            .record_create(Metric::GraphicsPipelineRequestCount, len64(infos.len()));
        let pipelines: Vec<Pipeline> = infos
            .iter()
            .map(|info| self.shadow(&mut state, info.clone()))
            .collect();
        self.resources
            .record_graphics_pipelines(device, &pipelines, infos);
        Ok(pipelines)
    }

    fn create_compute_pipelines(
        &self,
        device: Device,
        cache: PipelineCache,
        infos: &[ComputePipelineCreateInfo],
    ) -> DriverResult<Vec<Pipeline>> {
        if self.mode.is_replaying() {
            let pipelines = self
                .resources
                .create_compute_pipelines(&self.vk, device, cache, infos)?;
            let mut state = self.ledger.lock();
            for pipeline in &pipelines {
                state.note(EventKind::Forward, ObjectKind::Pipeline, pipeline.as_raw());
            }
            return Ok(pipelines);
        }
        let mut state = self.ledger.lock();
        state
            .stats
            .record_create(Metric::ComputePipelineRequestCount, len64(infos.len()));
        let pipelines: Vec<Pipeline> = infos
            .iter()
            .map(|info| self.shadow(&mut state, info.clone()))
            .collect();
        self.resources
            .record_compute_pipelines(device, &pipelines, infos);
        Ok(pipelines)
    }

    fn destroy_pipeline(&self, device: Device, pipeline: Pipeline) {
        if self.mode.is_replaying() {
            self.vk.destroy_pipeline(device, pipeline);
            return self.forwarded(pipeline);
        }
        let mut state = self.ledger.lock();
        let metric = if untrack::<GraphicsPipelineCreateInfo>(&mut state, pipeline).is_some() {
            Some(Metric::GraphicsPipelineRequestCount)
        } else if untrack::<ComputePipelineCreateInfo>(&mut state, pipeline).is_some() {
            Some(Metric::ComputePipelineRequestCount)
        } else {
            None
        };
        if let Some(metric) = metric {
            state.stats.record_destroy(metric, 1);
        }
        note_destroy(&mut state, metric.is_some(), ObjectKind::Pipeline, pipeline.as_raw());
    }

    fn create_render_pass(&self, device: Device, info: &RenderPassCreateInfo) -> DriverResult<RenderPass> {
        if self.mode.is_replaying() {
            return self.forward_hashed(self.vk.create_render_pass(device, info), info);
        }
        let mut state = self.ledger.lock();
        let stats = &mut state.stats;
        stats.record_create(Metric::RenderPassRequestCount, 1);
        stats.record_create(
            Metric::SubpassDescriptionRequestCount,
            len64(info.subpasses.len()),
        );
        stats.record_create(
            Metric::AttachmentDescriptionRequestCount,
            len64(info.attachments.len()),
        );
        let render_pass = self.shadow(&mut state, info.clone());
        self.resources.record_render_pass(device, render_pass, info);
        Ok(render_pass)
    }

    fn create_render_pass2(
        &self,
        device: Device,
        info: &RenderPassCreateInfo2,
    ) -> DriverResult<RenderPass> {
        if self.mode.is_replaying() {
            return self.forward_hashed(self.vk.create_render_pass2(device, info), info);
        }
        let mut state = self.ledger.lock();
        let stats = &mut state.stats;
        stats.record_create(Metric::RenderPassRequestCount, 1);
        stats.record_create(
            Metric::SubpassDescriptionRequestCount,
            len64(info.subpasses.len()),
        );
        stats.record_create(
            Metric::AttachmentDescriptionRequestCount,
            len64(info.attachments.len()),
        );
        let render_pass = self.shadow(&mut state, info.clone());
        self.resources.record_render_pass2(device, render_pass, info);
        Ok(render_pass)
    }

    fn destroy_render_pass(&self, device: Device, render_pass: RenderPass) {
        if self.mode.is_replaying() {
            self.vk.destroy_render_pass(device, render_pass);
            return self.forwarded(render_pass);
        }
        let mut state = self.ledger.lock();
        let counts = untrack::<RenderPassCreateInfo>(&mut state, render_pass)
            .map(|info| (info.subpasses.len(), info.attachments.len()))
            .or_else(|| {
                untrack::<RenderPassCreateInfo2>(&mut state, render_pass)
                    .map(|info| (info.subpasses.len(), info.attachments.len()))
            });
        if let Some((subpasses, attachments)) = counts {
            let stats = &mut state.stats;
            stats.record_destroy(Metric::RenderPassRequestCount, 1);
            stats.record_destroy(Metric::SubpassDescriptionRequestCount, len64(subpasses));
            stats.record_destroy(Metric::AttachmentDescriptionRequestCount, len64(attachments));
        }
        note_destroy(&mut state, counts.is_some(), ObjectKind::RenderPass, render_pass.as_raw());
    }

    fn create_sampler(&self, device: Device, info: &SamplerCreateInfo) -> DriverResult<Sampler> {
        if self.mode.is_replaying() {
            return self.forward_hashed(self.vk.create_sampler(device, info), info);
        }
        let mut state = self.ledger.lock();
        state.stats.record_create(Metric::SamplerRequestCount, 1);
        let sampler = self.shadow(&mut state, info.clone());
        self.resources.record_sampler(device, sampler, info);
        Ok(sampler)
    }

    fn destroy_sampler(&self, device: Device, sampler: Sampler) {
        if self.mode.is_replaying() {
            self.vk.destroy_sampler(device, sampler);
            return self.forwarded(sampler);
        }
        let mut state = self.ledger.lock();
        let hit = untrack::<SamplerCreateInfo>(&mut state, sampler).is_some();
        if hit {
            state.stats.record_destroy(Metric::SamplerRequestCount, 1);
        }
        note_destroy(&mut state, hit, ObjectKind::Sampler, sampler.as_raw());
    }

    fn create_sampler_ycbcr_conversion(
        &self,
        device: Device,
        info: &SamplerYcbcrConversionCreateInfo,
    ) -> DriverResult<SamplerYcbcrConversion> {
        if self.mode.is_replaying() {
            return self.forward_hashed(self.vk.create_sampler_ycbcr_conversion(device, info), info);
        }
        let mut state = self.ledger.lock();
        state
            .stats
            .record_create(Metric::SamplerYcbcrConversionRequestCount, 1);
        let conversion = self.shadow(&mut state, info.clone());
        self.resources
            .record_sampler_ycbcr_conversion(device, conversion, info);
        Ok(conversion)
    }

    fn destroy_sampler_ycbcr_conversion(&self, device: Device, conversion: SamplerYcbcrConversion) {
        if self.mode.is_replaying() {
            self.vk.destroy_sampler_ycbcr_conversion(device, conversion);
            return self.forwarded(conversion);
        }
        let mut state = self.ledger.lock();
        let hit = untrack::<SamplerYcbcrConversionCreateInfo>(&mut state, conversion).is_some();
        if hit {
            state
                .stats
                .record_destroy(Metric::SamplerYcbcrConversionRequestCount, 1);
        }
        note_destroy(
            &mut state,
            hit,
            ObjectKind::SamplerYcbcrConversion,
            conversion.as_raw(),
        );
    }

    fn create_shader_module(
        &self,
        device: Device,
        info: &ShaderModuleCreateInfo,
    ) -> DriverResult<ShaderModule> {
        let mut state = self.ledger.lock();
        let module = self
            .resources
            .create_shader_module(&self.vk, device, info, self.mode)?;
        let event = match self.mode {
            ProcessMode::Gathering => EventKind::Create,
            ProcessMode::Replaying => EventKind::Forward,
        };
        state.note(event, ObjectKind::ShaderModule, module.as_raw());
        Ok(module)
    }

    fn destroy_shader_module(&self, device: Device, module: ShaderModule) {
        let mut state = self.ledger.lock();
        self.resources
            .destroy_shader_module(&self.vk, device, module, self.mode);
        let event = match self.mode {
            ProcessMode::Gathering => EventKind::Destroy,
            ProcessMode::Replaying => EventKind::Forward,
        };
        state.note(event, ObjectKind::ShaderModule, module.as_raw());
    }

    fn create_command_pool(
        &self,
        device: Device,
        info: &CommandPoolCreateInfo,
    ) -> DriverResult<CommandPool> {
        if self.mode.is_replaying() {
            let consumption = self.resources.next_command_pool_size();
            let reserved = CommandPoolCreateInfo {
                memory_reservation: Some(consumption.reservation()),
                ..info.clone()
            };
            let pool = self.vk.create_command_pool(device, &reserved)?;
            self.forwarded(pool);
            return Ok(pool);
        }
        let mut state = self.ledger.lock();
        state.stats.record_create(Metric::CommandPoolRequestCount, 1);
        let pool = self.shadow(&mut state, info.clone());
        self.resources.record_command_pool(device, pool, info);
        Ok(pool)
    }

    fn reset_command_pool(&self, device: Device, pool: CommandPool, flags: u32) -> DriverResult<()> {
        match self.mode {
            ProcessMode::Gathering => Ok(()),
            ProcessMode::Replaying => self.vk.reset_command_pool(device, pool, flags),
        }
    }

    /// Destroying a tracked pool in the gathering pass also releases the
    /// command buffers allocated from it.
    fn destroy_command_pool(&self, device: Device, pool: CommandPool) {
        if self.mode.is_replaying() {
            self.vk.destroy_command_pool(device, pool);
            return self.forwarded(pool);
        }
        let mut state = self.ledger.lock();
        let hit = untrack::<CommandPoolCreateInfo>(&mut state, pool).is_some();
        if hit {
            let released = state.shadows.release_command_buffers_of(pool);
            state.stats.record_destroy(Metric::CommandPoolRequestCount, 1);
            state
                .stats
                .record_destroy(Metric::CommandBufferRequestCount, len64(released));
        }
        note_destroy(&mut state, hit, ObjectKind::CommandPool, pool.as_raw());
    }

    fn allocate_command_buffers(
        &self,
        device: Device,
        info: &CommandBufferAllocateInfo,
    ) -> DriverResult<Vec<CommandBuffer>> {
        if self.mode.is_replaying() {
            let buffers = self.vk.allocate_command_buffers(device, info)?;
            let mut state = self.ledger.lock();
            for buffer in &buffers {
                state.note(EventKind::Forward, ObjectKind::CommandBuffer, buffer.as_raw());
            }
            return Ok(buffers);
        }
        let mut state = self.ledger.lock();
        state.stats.record_create(
            Metric::CommandBufferRequestCount,
            u64::from(info.command_buffer_count),
        );
        let record = CommandBufferRecord {
            command_pool: info.command_pool,
            level: info.level,
        };
        let buffers: Vec<CommandBuffer> = (0..info.command_buffer_count)
            .map(|_| self.shadow(&mut state, record))
            .collect();
        self.resources
            .record_command_buffers(device, info, &buffers);
        Ok(buffers)
    }

    fn free_command_buffers(&self, device: Device, pool: CommandPool, buffers: &[CommandBuffer]) {
        if self.mode.is_replaying() {
            self.vk.free_command_buffers(device, pool, buffers);
            let mut state = self.ledger.lock();
            for buffer in buffers.iter().filter(|b| !b.is_null()) {
                state.note(EventKind::Forward, ObjectKind::CommandBuffer, buffer.as_raw());
            }
            return;
        }
        let mut state = self.ledger.lock();
        for buffer in buffers.iter().copied().filter(|b| !b.is_null()) {
            let hit = untrack::<CommandBufferRecord>(&mut state, buffer).is_some();
            if hit {
                state
                    .stats
                    .record_destroy(Metric::CommandBufferRequestCount, 1);
            }
            note_destroy(&mut state, hit, ObjectKind::CommandBuffer, buffer.as_raw());
        }
    }
}
