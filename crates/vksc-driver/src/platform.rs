//! Pass-through drivers.
//!
//! Each driver resolves its entry-point table once at construction and then
//! forwards every call one-to-one. Calling an entry point that did not
//! resolve returns [`DriverError::MissingEntryPoint`]; destroys through a
//! missing entry point do nothing.

use std::ffi::CStr;
use std::ptr;

use vksc_core::handle::{
    CommandBuffer, CommandPool, DescriptorSetLayout, Device, ImageView, Instance, PhysicalDevice,
    Pipeline, PipelineCache, PipelineLayout, QueryPool, RawHandle, RenderPass, Sampler,
    SamplerYcbcrConversion, ShaderModule,
};
use vksc_core::info::{
    CommandBufferAllocateInfo, CommandPoolCreateInfo, ComputePipelineCreateInfo,
    DescriptorSetLayoutCreateInfo, DescriptorSetLayoutSupport, DeviceCreateInfo,
    GraphicsPipelineCreateInfo, ImageViewCreateInfo, InstanceCreateInfo, PipelineLayoutCreateInfo,
    QueryPoolCreateInfo, RenderPassCreateInfo, RenderPassCreateInfo2, SamplerCreateInfo,
    SamplerYcbcrConversionCreateInfo, ShaderModuleCreateInfo,
};
use vksc_core::{DeviceInterface, DriverError, DriverResult, VkResult};

use crate::interface::{InstanceInterface, PlatformInterface};
use crate::library::{FunctionLibrary, RawFn};
use crate::tables::{
    DeviceFunctions, InstanceFunctions, PfnCreate, PfnCreatePipelines, PfnDestroy,
    PfnGetDeviceProcAddr, PfnGetInstanceProcAddr, PlatformFunctions,
};

fn entry<F>(slot: Option<F>, name: &'static str) -> DriverResult<F> {
    slot.ok_or(DriverError::MissingEntryPoint(name))
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PlatformDriver {
    vk: PlatformFunctions,
}

impl PlatformDriver {
    /// Resolve `vkGetInstanceProcAddr` from `library`, then every global
    /// entry point through it.
    ///
    /// # Safety
    ///
    /// `library` must export a conforming `vkGetInstanceProcAddr`, and every
    /// entry point it resolves must accept this crate's Rust descriptor
    /// layout (see [`tables`](crate::tables)). A real driver opened through
    /// [`DynamicLibrary`](crate::library::DynamicLibrary) expects C structures
    /// and needs a translation layer in front of it; handing it these tables
    /// directly is undefined behaviour.
    pub unsafe fn new(library: &dyn FunctionLibrary) -> Self {
        let gipa = library
            .get_function(c"vkGetInstanceProcAddr")
            // SAFETY: caller guarantees the exported symbol has this signature.
            .map(|f| unsafe { std::mem::transmute::<RawFn, PfnGetInstanceProcAddr>(f) });
        let mut vk = match gipa {
            Some(gipa) => {
                // SAFETY: gipa is the driver's vkGetInstanceProcAddr; each name is NUL-terminated.
                unsafe { PlatformFunctions::load(|name| gipa(Instance::null(), name.as_ptr())) }
            }
            None => PlatformFunctions::default(),
        };
        vk.get_instance_proc_addr = gipa;
        Self { vk }
    }

    #[must_use]
    pub fn functions(&self) -> &PlatformFunctions {
        &self.vk
    }
}

impl PlatformInterface for PlatformDriver {
    fn get_instance_proc_addr(&self, instance: Instance, name: &CStr) -> Option<RawFn> {
        let gipa = self.vk.get_instance_proc_addr?;
        // SAFETY: forwards to the driver with a NUL-terminated name.
        unsafe { gipa(instance, name.as_ptr()) }
    }

    fn create_instance(&self, info: &InstanceCreateInfo) -> DriverResult<Instance> {
        let f = entry(self.vk.create_instance, "vkCreateInstance")?;
        let mut out = Instance::null();
        // SAFETY: info and out are valid for the duration of the call.
        unsafe { f(info, ptr::null(), &mut out) }.result()?;
        Ok(out)
    }

    fn enumerate_instance_version(&self) -> DriverResult<u32> {
        let f = entry(self.vk.enumerate_instance_version, "vkEnumerateInstanceVersion")?;
        let mut version = 0;
        // SAFETY: out pointer is valid.
        unsafe { f(&mut version) }.result()?;
        Ok(version)
    }
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct InstanceDriver {
    vk: InstanceFunctions,
}

impl InstanceDriver {
    /// Resolve every instance-level entry point for `instance`.
    ///
    /// # Safety
    ///
    /// `platform` must return addresses matching each entry point's signature,
    /// including the Rust descriptor layout those signatures pass by pointer.
    /// A real driver only qualifies behind a translation layer to C layout.
    pub unsafe fn new(platform: &dyn PlatformInterface, instance: Instance) -> Self {
        // SAFETY: forwarded to the caller.
        let vk = unsafe { InstanceFunctions::load(|name| platform.get_instance_proc_addr(instance, name)) };
        Self { vk }
    }

    #[must_use]
    pub fn functions(&self) -> &InstanceFunctions {
        &self.vk
    }
}

impl InstanceInterface for InstanceDriver {
    fn destroy_instance(&self, instance: Instance) {
        if let Some(f) = self.vk.destroy_instance {
            // SAFETY: forwards the caller's handle.
            unsafe { f(instance, ptr::null()) }
        }
    }

    fn enumerate_physical_devices(&self, instance: Instance) -> DriverResult<Vec<PhysicalDevice>> {
        let f = entry(self.vk.enumerate_physical_devices, "vkEnumeratePhysicalDevices")?;
        let mut count = 0_u32;
        // SAFETY: count query with null output array.
        unsafe { f(instance, &mut count, ptr::null_mut()) }.result()?;
        let mut out = vec![PhysicalDevice::null(); count as usize];
        // SAFETY: out holds `count` elements.
        let result = unsafe { f(instance, &mut count, out.as_mut_ptr()) };
        if result != VkResult::INCOMPLETE {
            result.result()?;
        }
        out.truncate(count as usize);
        Ok(out)
    }

    fn create_device(
        &self,
        physical_device: PhysicalDevice,
        info: &DeviceCreateInfo,
    ) -> DriverResult<Device> {
        let f = entry(self.vk.create_device, "vkCreateDevice")?;
        let mut out = Device::null();
        // SAFETY: info and out are valid for the duration of the call.
        unsafe { f(physical_device, info, ptr::null(), &mut out) }.result()?;
        Ok(out)
    }

    fn get_device_proc_addr(&self, device: Device, name: &CStr) -> Option<RawFn> {
        let gdpa = self.vk.get_device_proc_addr?;
        // SAFETY: forwards to the driver with a NUL-terminated name.
        unsafe { gdpa(device, name.as_ptr()) }
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DeviceDriver {
    vk: DeviceFunctions,
}

impl DeviceDriver {
    /// Resolve `vkGetDeviceProcAddr` through the instance, then every device
    /// entry point through it.
    ///
    /// # Safety
    ///
    /// `platform` must return addresses matching each entry point's signature,
    /// including the Rust descriptor layout those signatures pass by pointer.
    /// A real driver only qualifies behind a translation layer to C layout.
    pub unsafe fn new(platform: &dyn PlatformInterface, instance: Instance, device: Device) -> Self {
        let gdpa = platform
            .get_instance_proc_addr(instance, c"vkGetDeviceProcAddr")
            // SAFETY: caller guarantees the address has this signature.
            .map(|f| unsafe { std::mem::transmute::<RawFn, PfnGetDeviceProcAddr>(f) });
        let vk = match gdpa {
            // SAFETY: gdpa is the driver's vkGetDeviceProcAddr; each name is NUL-terminated.
            Some(gdpa) => unsafe { DeviceFunctions::load(|name| gdpa(device, name.as_ptr())) },
            None => DeviceFunctions::default(),
        };
        Self { vk }
    }

    /// Wrap an already resolved table.
    #[must_use]
    pub const fn from_functions(vk: DeviceFunctions) -> Self {
        Self { vk }
    }

    #[must_use]
    pub fn functions(&self) -> &DeviceFunctions {
        &self.vk
    }

    fn create<I, H: RawHandle>(
        slot: Option<PfnCreate<I, H>>,
        name: &'static str,
        device: Device,
        info: &I,
    ) -> DriverResult<H> {
        let f = entry(slot, name)?;
        let mut out = H::null();
        // SAFETY: info and out are valid for the duration of the call.
        unsafe { f(device, info, ptr::null(), &mut out) }.result()?;
        Ok(out)
    }

    fn destroy<H>(slot: Option<PfnDestroy<H>>, device: Device, object: H) {
        if let Some(f) = slot {
            // SAFETY: forwards the caller's handles.
            unsafe { f(device, object, ptr::null()) }
        }
    }

    fn create_pipelines<I>(
        slot: Option<PfnCreatePipelines<I>>,
        name: &'static str,
        device: Device,
        cache: PipelineCache,
        infos: &[I],
    ) -> DriverResult<Vec<Pipeline>> {
        let f = entry(slot, name)?;
        let count = u32::try_from(infos.len()).map_err(|_| DriverError::Vk(VkResult::ERROR_OUT_OF_HOST_MEMORY))?;
        let mut out = vec![Pipeline::null(); infos.len()];
        // SAFETY: infos and out both hold `count` elements.
        unsafe { f(device, cache, count, infos.as_ptr(), ptr::null(), out.as_mut_ptr()) }.result()?;
        Ok(out)
    }
}

impl DeviceInterface for DeviceDriver {
    fn destroy_device(&self, device: Device) {
        if let Some(f) = self.vk.destroy_device {
            // SAFETY: forwards the caller's handle.
            unsafe { f(device, ptr::null()) }
        }
    }

    fn create_descriptor_set_layout(
        &self,
        device: Device,
        info: &DescriptorSetLayoutCreateInfo,
    ) -> DriverResult<DescriptorSetLayout> {
        Self::create(self.vk.create_descriptor_set_layout, "vkCreateDescriptorSetLayout", device, info)
    }

    fn destroy_descriptor_set_layout(&self, device: Device, layout: DescriptorSetLayout) {
        Self::destroy(self.vk.destroy_descriptor_set_layout, device, layout);
    }

    fn get_descriptor_set_layout_support(
        &self,
        device: Device,
        info: &DescriptorSetLayoutCreateInfo,
    ) -> DriverResult<DescriptorSetLayoutSupport> {
        let f = entry(
            self.vk.get_descriptor_set_layout_support,
            "vkGetDescriptorSetLayoutSupport",
        )?;
        let mut out = DescriptorSetLayoutSupport::default();
        // SAFETY: info and out are valid for the duration of the call.
        unsafe { f(device, info, &mut out) };
        Ok(out)
    }

    fn create_image_view(&self, device: Device, info: &ImageViewCreateInfo) -> DriverResult<ImageView> {
        Self::create(self.vk.create_image_view, "vkCreateImageView", device, info)
    }

    fn destroy_image_view(&self, device: Device, view: ImageView) {
        Self::destroy(self.vk.destroy_image_view, device, view);
    }

    fn create_query_pool(&self, device: Device, info: &QueryPoolCreateInfo) -> DriverResult<QueryPool> {
        Self::create(self.vk.create_query_pool, "vkCreateQueryPool", device, info)
    }

    fn destroy_query_pool(&self, device: Device, pool: QueryPool) {
        Self::destroy(self.vk.destroy_query_pool, device, pool);
    }

    fn create_pipeline_layout(
        &self,
        device: Device,
        info: &PipelineLayoutCreateInfo,
    ) -> DriverResult<PipelineLayout> {
        Self::create(self.vk.create_pipeline_layout, "vkCreatePipelineLayout", device, info)
    }

    fn destroy_pipeline_layout(&self, device: Device, layout: PipelineLayout) {
        Self::destroy(self.vk.destroy_pipeline_layout, device, layout);
    }

    fn create_graphics_pipelines(
        &self,
        device: Device,
        cache: PipelineCache,
        infos: &[GraphicsPipelineCreateInfo],
    ) -> DriverResult<Vec<Pipeline>> {
        Self::create_pipelines(
            self.vk.create_graphics_pipelines,
            "vkCreateGraphicsPipelines",
            device,
            cache,
            infos,
        )
    }

    fn create_compute_pipelines(
        &self,
        device: Device,
        cache: PipelineCache,
        infos: &[ComputePipelineCreateInfo],
    ) -> DriverResult<Vec<Pipeline>> {
        Self::create_pipelines(
            self.vk.create_compute_pipelines,
            "vkCreateComputePipelines",
            device,
            cache,
            infos,
        )
    }

    fn destroy_pipeline(&self, device: Device, pipeline: Pipeline) {
        Self::destroy(self.vk.destroy_pipeline, device, pipeline);
    }

    fn create_render_pass(&self, device: Device, info: &RenderPassCreateInfo) -> DriverResult<RenderPass> {
        Self::create(self.vk.create_render_pass, "vkCreateRenderPass", device, info)
    }

    fn create_render_pass2(
        &self,
        device: Device,
        info: &RenderPassCreateInfo2,
    ) -> DriverResult<RenderPass> {
        Self::create(self.vk.create_render_pass2, "vkCreateRenderPass2", device, info)
    }

    fn destroy_render_pass(&self, device: Device, render_pass: RenderPass) {
        Self::destroy(self.vk.destroy_render_pass, device, render_pass);
    }

    fn create_sampler(&self, device: Device, info: &SamplerCreateInfo) -> DriverResult<Sampler> {
        Self::create(self.vk.create_sampler, "vkCreateSampler", device, info)
    }

    fn destroy_sampler(&self, device: Device, sampler: Sampler) {
        Self::destroy(self.vk.destroy_sampler, device, sampler);
    }

    fn create_sampler_ycbcr_conversion(
        &self,
        device: Device,
        info: &SamplerYcbcrConversionCreateInfo,
    ) -> DriverResult<SamplerYcbcrConversion> {
        Self::create(
            self.vk.create_sampler_ycbcr_conversion,
            "vkCreateSamplerYcbcrConversion",
            device,
            info,
        )
    }

    fn destroy_sampler_ycbcr_conversion(&self, device: Device, conversion: SamplerYcbcrConversion) {
        Self::destroy(self.vk.destroy_sampler_ycbcr_conversion, device, conversion);
    }

    fn create_shader_module(
        &self,
        device: Device,
        info: &ShaderModuleCreateInfo,
    ) -> DriverResult<ShaderModule> {
        Self::create(self.vk.create_shader_module, "vkCreateShaderModule", device, info)
    }

    fn destroy_shader_module(&self, device: Device, module: ShaderModule) {
        Self::destroy(self.vk.destroy_shader_module, device, module);
    }

    fn create_command_pool(
        &self,
        device: Device,
        info: &CommandPoolCreateInfo,
    ) -> DriverResult<CommandPool> {
        Self::create(self.vk.create_command_pool, "vkCreateCommandPool", device, info)
    }

    fn reset_command_pool(&self, device: Device, pool: CommandPool, flags: u32) -> DriverResult<()> {
        let f = entry(self.vk.reset_command_pool, "vkResetCommandPool")?;
        // SAFETY: forwards the caller's handles.
        unsafe { f(device, pool, flags) }.result()
    }

    fn destroy_command_pool(&self, device: Device, pool: CommandPool) {
        Self::destroy(self.vk.destroy_command_pool, device, pool);
    }

    fn allocate_command_buffers(
        &self,
        device: Device,
        info: &CommandBufferAllocateInfo,
    ) -> DriverResult<Vec<CommandBuffer>> {
        let f = entry(self.vk.allocate_command_buffers, "vkAllocateCommandBuffers")?;
        let mut out = vec![CommandBuffer::null(); info.command_buffer_count as usize];
        // SAFETY: out holds command_buffer_count elements.
        unsafe { f(device, info, out.as_mut_ptr()) }.result()?;
        Ok(out)
    }

    fn free_command_buffers(&self, device: Device, pool: CommandPool, buffers: &[CommandBuffer]) {
        let Some(f) = self.vk.free_command_buffers else {
            return;
        };
        let Ok(count) = u32::try_from(buffers.len()) else {
            return;
        };
        // SAFETY: buffers holds `count` elements.
        unsafe { f(device, pool, count, buffers.as_ptr()) }
    }
}
