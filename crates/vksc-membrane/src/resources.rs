//! Resource budgeting and sequencing collaborator.
//!
//! [`ResourceInterface`] is the single source of truth for handle numbering
//! and process mode. Device wrappers borrow it for their whole lifetime and
//! notify it of every tracked creation so the supervising process can build
//! the reservation a replay pass needs. Shader modules and, in the replay
//! pass, pipelines are created through it rather than directly.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use vksc_core::handle::{
    CommandBuffer, CommandPool, DescriptorSetLayout, Device, ObjectKind, Pipeline, PipelineCache,
    PipelineLayout, RenderPass, Sampler, SamplerYcbcrConversion, ShaderModule,
};
use vksc_core::info::{
    CommandBufferAllocateInfo, CommandPoolCreateInfo, CommandPoolMemoryReservationCreateInfo,
    ComputePipelineCreateInfo, DescriptorSetLayoutCreateInfo, DeviceCreateInfo,
    GraphicsPipelineCreateInfo, PipelineLayoutCreateInfo, RenderPassCreateInfo,
    RenderPassCreateInfo2, SamplerCreateInfo, SamplerYcbcrConversionCreateInfo,
    ShaderModuleCreateInfo,
};
use vksc_core::object_hash::{ObjectHash, shader_module_hash};
use vksc_core::{DeviceInterface, DriverResult};

use crate::config::{MembraneConfig, ProcessMode};
use crate::statistics::StatisticsSnapshot;

/// Memory a command pool must reserve in the replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CommandPoolMemoryConsumption {
    pub reserved_size: u64,
    pub command_buffer_count: u32,
}

impl CommandPoolMemoryConsumption {
    /// The reservation chained onto command-pool creation.
    #[must_use]
    pub const fn reservation(self) -> CommandPoolMemoryReservationCreateInfo {
        CommandPoolMemoryReservationCreateInfo {
            command_pool_reserved_size: self.reserved_size,
            command_pool_max_command_buffers: self.command_buffer_count,
        }
    }
}

/// Collaborator consulted by the safety-critical drivers.
///
/// Notification hooks default to no-ops; pipeline creation in the replay pass
/// defaults to forwarding to the real driver.
pub trait ResourceInterface: Send + Sync {
    /// Mode of this process. Fixed for the process lifetime.
    fn process_mode(&self) -> ProcessMode;

    /// Next synthetic handle. Strictly increasing, never zero.
    fn inc_resource_counter(&self) -> u64;

    /// Reservation for the next command pool created in the replay pass.
    fn next_command_pool_size(&self) -> CommandPoolMemoryConsumption;

    fn init_device(&self, _device: Device) {}

    /// Called once when a device wrapper goes away, with its final statistics.
    fn deinit_device(&self, _device: Device, _statistics: &StatisticsSnapshot) {}

    fn register_device_features(&self, _device: Device, _info: &DeviceCreateInfo) {}

    fn unregister_device_features(&self, _device: Device) {}

    fn record_descriptor_set_layout(
        &self,
        _device: Device,
        _layout: DescriptorSetLayout,
        _info: &DescriptorSetLayoutCreateInfo,
    ) {
    }

    fn record_pipeline_layout(
        &self,
        _device: Device,
        _layout: PipelineLayout,
        _info: &PipelineLayoutCreateInfo,
    ) {
    }

    fn record_render_pass(&self, _device: Device, _render_pass: RenderPass, _info: &RenderPassCreateInfo) {}

    fn record_render_pass2(
        &self,
        _device: Device,
        _render_pass: RenderPass,
        _info: &RenderPassCreateInfo2,
    ) {
    }

    fn record_sampler(&self, _device: Device, _sampler: Sampler, _info: &SamplerCreateInfo) {}

    fn record_sampler_ycbcr_conversion(
        &self,
        _device: Device,
        _conversion: SamplerYcbcrConversion,
        _info: &SamplerYcbcrConversionCreateInfo,
    ) {
    }

    fn record_graphics_pipelines(
        &self,
        _device: Device,
        _pipelines: &[Pipeline],
        _infos: &[GraphicsPipelineCreateInfo],
    ) {
    }

    fn record_compute_pipelines(
        &self,
        _device: Device,
        _pipelines: &[Pipeline],
        _infos: &[ComputePipelineCreateInfo],
    ) {
    }

    fn record_command_pool(&self, _device: Device, _pool: CommandPool, _info: &CommandPoolCreateInfo) {}

    fn record_command_buffers(
        &self,
        _device: Device,
        _info: &CommandBufferAllocateInfo,
        _buffers: &[CommandBuffer],
    ) {
    }

    /// Replay-pass graphics pipeline creation.
    fn create_graphics_pipelines(
        &self,
        driver: &dyn DeviceInterface,
        device: Device,
        cache: PipelineCache,
        infos: &[GraphicsPipelineCreateInfo],
    ) -> DriverResult<Vec<Pipeline>> {
        driver.create_graphics_pipelines(device, cache, infos)
    }

    /// Replay-pass compute pipeline creation.
    fn create_compute_pipelines(
        &self,
        driver: &dyn DeviceInterface,
        device: Device,
        cache: PipelineCache,
        infos: &[ComputePipelineCreateInfo],
    ) -> DriverResult<Vec<Pipeline>> {
        driver.create_compute_pipelines(device, cache, infos)
    }

    /// Shader modules are created here in both modes; the implementation
    /// decides whether the real driver is involved.
    fn create_shader_module(
        &self,
        driver: &dyn DeviceInterface,
        device: Device,
        info: &ShaderModuleCreateInfo,
        mode: ProcessMode,
    ) -> DriverResult<ShaderModule>;

    fn destroy_shader_module(
        &self,
        driver: &dyn DeviceInterface,
        device: Device,
        module: ShaderModule,
        mode: ProcessMode,
    ) {
        if mode.is_replaying() {
            driver.destroy_shader_module(device, module);
        }
    }

    /// Account one recorded command of `function_name` against `command_buffer`.
    fn increase_command_buffer_size(&self, command_buffer: CommandBuffer, function_name: &str);
}

/// Usage recorded against one command buffer during gathering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBufferUsage {
    pub commands: u64,
    pub functions: BTreeMap<String, u64>,
}

#[derive(Debug, Default)]
struct ResourceState {
    live_devices: Vec<Device>,
    device_features: HashMap<Device, Vec<String>>,
    final_statistics: Vec<(Device, StatisticsSnapshot)>,
    requests: BTreeMap<ObjectKind, u64>,
    shader_modules: BTreeMap<ShaderModule, ObjectHash>,
    command_buffers: HashMap<CommandBuffer, CommandBufferUsage>,
}

impl ResourceState {
    fn count(&mut self, kind: ObjectKind, n: usize) {
        *self.requests.entry(kind).or_insert(0) += n as u64;
    }
}

/// In-process collaborator used by both passes.
///
/// The handle counter is atomic and lives outside the state lock; everything
/// else is behind one `parking_lot::Mutex`.
#[derive(Debug)]
pub struct StandardResources {
    mode: ProcessMode,
    counter: AtomicU64,
    default_pool_size: CommandPoolMemoryConsumption,
    pool_sizes: Mutex<VecDeque<CommandPoolMemoryConsumption>>,
    state: Mutex<ResourceState>,
}

impl StandardResources {
    #[must_use]
    pub fn new(mode: ProcessMode) -> Self {
        Self::from_config(&MembraneConfig::with_mode(mode))
    }

    #[must_use]
    pub fn from_config(config: &MembraneConfig) -> Self {
        Self::with_counter_start(config, 0)
    }

    /// Continue numbering after `start`; the first issued handle is `start + 1`.
    #[must_use]
    pub fn with_counter_start(config: &MembraneConfig, start: u64) -> Self {
        Self {
            mode: config.process_mode,
            counter: AtomicU64::new(start),
            default_pool_size: CommandPoolMemoryConsumption {
                reserved_size: config.command_pool_reserved_size,
                command_buffer_count: config.command_pool_max_buffers,
            },
            pool_sizes: Mutex::new(VecDeque::new()),
            state: Mutex::new(ResourceState::default()),
        }
    }

    /// Last issued handle value.
    #[must_use]
    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    /// Queue per-pool estimates for the replay pass, consumed in order.
    pub fn push_command_pool_sizes<I>(&self, sizes: I)
    where
        I: IntoIterator<Item = CommandPoolMemoryConsumption>,
    {
        self.pool_sizes.lock().extend(sizes);
    }

    #[must_use]
    pub fn queued_command_pool_sizes(&self) -> usize {
        self.pool_sizes.lock().len()
    }

    /// Creation requests recorded per kind.
    #[must_use]
    pub fn requests(&self) -> BTreeMap<ObjectKind, u64> {
        self.state.lock().requests.clone()
    }

    #[must_use]
    pub fn requests_for(&self, kind: ObjectKind) -> u64 {
        self.state.lock().requests.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn device_features(&self, device: Device) -> Option<Vec<String>> {
        self.state.lock().device_features.get(&device).cloned()
    }

    #[must_use]
    pub fn live_devices(&self) -> Vec<Device> {
        self.state.lock().live_devices.clone()
    }

    /// Statistics handed over by devices that have been torn down, in teardown order.
    #[must_use]
    pub fn final_statistics(&self) -> Vec<(Device, StatisticsSnapshot)> {
        self.state.lock().final_statistics.clone()
    }

    /// Fingerprint of a synthetic shader module's code.
    #[must_use]
    pub fn shader_module_hash(&self, module: ShaderModule) -> Option<ObjectHash> {
        self.state.lock().shader_modules.get(&module).copied()
    }

    #[must_use]
    pub fn command_buffer_usage(&self, command_buffer: CommandBuffer) -> Option<CommandBufferUsage> {
        self.state.lock().command_buffers.get(&command_buffer).cloned()
    }
}

impl ResourceInterface for StandardResources {
    fn process_mode(&self) -> ProcessMode {
        self.mode
    }

    fn inc_resource_counter(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn next_command_pool_size(&self) -> CommandPoolMemoryConsumption {
        self.pool_sizes
            .lock()
            .pop_front()
            .unwrap_or(self.default_pool_size)
    }

    fn init_device(&self, device: Device) {
        let mut state = self.state.lock();
        if !state.live_devices.contains(&device) {
            state.live_devices.push(device);
        }
    }

    fn deinit_device(&self, device: Device, statistics: &StatisticsSnapshot) {
        let mut state = self.state.lock();
        state.live_devices.retain(|d| *d != device);
        state.final_statistics.push((device, *statistics));
    }

    fn register_device_features(&self, device: Device, info: &DeviceCreateInfo) {
        self.state
            .lock()
            .device_features
            .insert(device, info.enabled_feature_names.clone());
    }

    fn unregister_device_features(&self, device: Device) {
        self.state.lock().device_features.remove(&device);
    }

    fn record_descriptor_set_layout(
        &self,
        _device: Device,
        _layout: DescriptorSetLayout,
        _info: &DescriptorSetLayoutCreateInfo,
    ) {
        self.state.lock().count(ObjectKind::DescriptorSetLayout, 1);
    }

    fn record_pipeline_layout(
        &self,
        _device: Device,
        _layout: PipelineLayout,
        _info: &PipelineLayoutCreateInfo,
    ) {
        self.state.lock().count(ObjectKind::PipelineLayout, 1);
    }

    fn record_render_pass(&self, _device: Device, _render_pass: RenderPass, _info: &RenderPassCreateInfo) {
        self.state.lock().count(ObjectKind::RenderPass, 1);
    }

    fn record_render_pass2(
        &self,
        _device: Device,
        _render_pass: RenderPass,
        _info: &RenderPassCreateInfo2,
    ) {
        self.state.lock().count(ObjectKind::RenderPass, 1);
    }

    fn record_sampler(&self, _device: Device, _sampler: Sampler, _info: &SamplerCreateInfo) {
        self.state.lock().count(ObjectKind::Sampler, 1);
    }

    fn record_sampler_ycbcr_conversion(
        &self,
        _device: Device,
        _conversion: SamplerYcbcrConversion,
        _info: &SamplerYcbcrConversionCreateInfo,
    ) {
        self.state.lock().count(ObjectKind::SamplerYcbcrConversion, 1);
    }

    fn record_graphics_pipelines(
        &self,
        _device: Device,
        pipelines: &[Pipeline],
        _infos: &[GraphicsPipelineCreateInfo],
    ) {
        self.state.lock().count(ObjectKind::Pipeline, pipelines.len());
    }

    fn record_compute_pipelines(
        &self,
        _device: Device,
        pipelines: &[Pipeline],
        _infos: &[ComputePipelineCreateInfo],
    ) {
        self.state.lock().count(ObjectKind::Pipeline, pipelines.len());
    }

    fn record_command_pool(&self, _device: Device, _pool: CommandPool, _info: &CommandPoolCreateInfo) {
        self.state.lock().count(ObjectKind::CommandPool, 1);
    }

    fn record_command_buffers(
        &self,
        _device: Device,
        _info: &CommandBufferAllocateInfo,
        buffers: &[CommandBuffer],
    ) {
        let mut state = self.state.lock();
        state.count(ObjectKind::CommandBuffer, buffers.len());
        for buffer in buffers {
            state.command_buffers.entry(*buffer).or_default();
        }
    }

    fn create_shader_module(
        &self,
        driver: &dyn DeviceInterface,
        device: Device,
        info: &ShaderModuleCreateInfo,
        mode: ProcessMode,
    ) -> DriverResult<ShaderModule> {
        match mode {
            ProcessMode::Replaying => driver.create_shader_module(device, info),
            ProcessMode::Gathering => {
                let module = ShaderModule::from_raw(self.inc_resource_counter());
                let mut state = self.state.lock();
                state.count(ObjectKind::ShaderModule, 1);
                state.shader_modules.insert(module, shader_module_hash(info));
                Ok(module)
            }
        }
    }

    fn destroy_shader_module(
        &self,
        driver: &dyn DeviceInterface,
        device: Device,
        module: ShaderModule,
        mode: ProcessMode,
    ) {
        match mode {
            ProcessMode::Replaying => driver.destroy_shader_module(device, module),
            ProcessMode::Gathering => {
                self.state.lock().shader_modules.remove(&module);
            }
        }
    }

    fn increase_command_buffer_size(&self, command_buffer: CommandBuffer, function_name: &str) {
        let mut state = self.state.lock();
        let usage = state.command_buffers.entry(command_buffer).or_default();
        usage.commands += 1;
        *usage.functions.entry(function_name.to_owned()).or_insert(0) += 1;
    }
}
