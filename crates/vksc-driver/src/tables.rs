//! Typed entry-point signatures and the platform, instance and device tables.
//!
//! Descriptors cross the boundary by pointer to their Rust representation;
//! conversion to the C structure layout belongs to the generated binding
//! layer in front of a real driver.

#![allow(improper_ctypes_definitions)]

use std::ffi::{c_char, c_void};

use vksc_core::VkResult;
use vksc_core::handle::{
    CommandBuffer, CommandPool, DescriptorSetLayout, Device, ImageView, Instance, PhysicalDevice,
    Pipeline, PipelineCache, PipelineLayout, QueryPool, RenderPass, Sampler,
    SamplerYcbcrConversion, ShaderModule,
};
use vksc_core::info::{
    CommandBufferAllocateInfo, CommandPoolCreateInfo, ComputePipelineCreateInfo,
    DescriptorSetLayoutCreateInfo, DescriptorSetLayoutSupport, DeviceCreateInfo,
    GraphicsPipelineCreateInfo, ImageViewCreateInfo, InstanceCreateInfo, PipelineLayoutCreateInfo,
    QueryPoolCreateInfo, RenderPassCreateInfo, RenderPassCreateInfo2, SamplerCreateInfo,
    SamplerYcbcrConversionCreateInfo, ShaderModuleCreateInfo,
};

use crate::library::RawFn;
use crate::macros::entry_point_table;

/// Allocation callbacks are never supplied; always null.
pub type Allocator = *const c_void;

// Platform
pub type PfnGetInstanceProcAddr =
    unsafe extern "system" fn(instance: Instance, name: *const c_char) -> Option<RawFn>;
pub type PfnCreateInstance = unsafe extern "system" fn(
    info: *const InstanceCreateInfo,
    allocator: Allocator,
    out: *mut Instance,
) -> VkResult;
pub type PfnEnumerateInstanceVersion = unsafe extern "system" fn(out: *mut u32) -> VkResult;

// Instance
pub type PfnDestroyInstance = unsafe extern "system" fn(instance: Instance, allocator: Allocator);
pub type PfnEnumeratePhysicalDevices = unsafe extern "system" fn(
    instance: Instance,
    count: *mut u32,
    out: *mut PhysicalDevice,
) -> VkResult;
pub type PfnCreateDevice = unsafe extern "system" fn(
    physical_device: PhysicalDevice,
    info: *const DeviceCreateInfo,
    allocator: Allocator,
    out: *mut Device,
) -> VkResult;
pub type PfnGetDeviceProcAddr =
    unsafe extern "system" fn(device: Device, name: *const c_char) -> Option<RawFn>;

// Device
pub type PfnDestroyDevice = unsafe extern "system" fn(device: Device, allocator: Allocator);

/// `vkCreate*` shape shared by every single-object create.
pub type PfnCreate<I, H> =
    unsafe extern "system" fn(device: Device, info: *const I, allocator: Allocator, out: *mut H) -> VkResult;

/// `vkDestroy*` shape shared by every single-object destroy.
pub type PfnDestroy<H> = unsafe extern "system" fn(device: Device, object: H, allocator: Allocator);

pub type PfnGetDescriptorSetLayoutSupport = unsafe extern "system" fn(
    device: Device,
    info: *const DescriptorSetLayoutCreateInfo,
    out: *mut DescriptorSetLayoutSupport,
);

/// `vkCreate*Pipelines` batch shape.
pub type PfnCreatePipelines<I> = unsafe extern "system" fn(
    device: Device,
    cache: PipelineCache,
    count: u32,
    infos: *const I,
    allocator: Allocator,
    out: *mut Pipeline,
) -> VkResult;

pub type PfnResetCommandPool =
    unsafe extern "system" fn(device: Device, pool: CommandPool, flags: u32) -> VkResult;
pub type PfnAllocateCommandBuffers = unsafe extern "system" fn(
    device: Device,
    info: *const CommandBufferAllocateInfo,
    out: *mut CommandBuffer,
) -> VkResult;
pub type PfnFreeCommandBuffers = unsafe extern "system" fn(
    device: Device,
    pool: CommandPool,
    count: u32,
    buffers: *const CommandBuffer,
);

entry_point_table! {
    /// Global entry points, resolved through `vkGetInstanceProcAddr(NULL, ..)`.
    pub struct PlatformFunctions {
        get_instance_proc_addr: PfnGetInstanceProcAddr = c"vkGetInstanceProcAddr",
        create_instance: PfnCreateInstance = c"vkCreateInstance",
        enumerate_instance_version: PfnEnumerateInstanceVersion = c"vkEnumerateInstanceVersion",
    }
}

entry_point_table! {
    pub struct InstanceFunctions {
        destroy_instance: PfnDestroyInstance = c"vkDestroyInstance",
        enumerate_physical_devices: PfnEnumeratePhysicalDevices = c"vkEnumeratePhysicalDevices",
        create_device: PfnCreateDevice = c"vkCreateDevice",
        get_device_proc_addr: PfnGetDeviceProcAddr = c"vkGetDeviceProcAddr",
    }
}

entry_point_table! {
    pub struct DeviceFunctions {
        destroy_device: PfnDestroyDevice = c"vkDestroyDevice",
        create_descriptor_set_layout: PfnCreate<DescriptorSetLayoutCreateInfo, DescriptorSetLayout>
            = c"vkCreateDescriptorSetLayout",
        destroy_descriptor_set_layout: PfnDestroy<DescriptorSetLayout> = c"vkDestroyDescriptorSetLayout",
        get_descriptor_set_layout_support: PfnGetDescriptorSetLayoutSupport
            = c"vkGetDescriptorSetLayoutSupport",
        create_image_view: PfnCreate<ImageViewCreateInfo, ImageView> = c"vkCreateImageView",
        destroy_image_view: PfnDestroy<ImageView> = c"vkDestroyImageView",
        create_query_pool: PfnCreate<QueryPoolCreateInfo, QueryPool> = c"vkCreateQueryPool",
        destroy_query_pool: PfnDestroy<QueryPool> = c"vkDestroyQueryPool",
        create_pipeline_layout: PfnCreate<PipelineLayoutCreateInfo, PipelineLayout>
            = c"vkCreatePipelineLayout",
        destroy_pipeline_layout: PfnDestroy<PipelineLayout> = c"vkDestroyPipelineLayout",
        create_graphics_pipelines: PfnCreatePipelines<GraphicsPipelineCreateInfo>
            = c"vkCreateGraphicsPipelines",
        create_compute_pipelines: PfnCreatePipelines<ComputePipelineCreateInfo>
            = c"vkCreateComputePipelines",
        destroy_pipeline: PfnDestroy<Pipeline> = c"vkDestroyPipeline",
        create_render_pass: PfnCreate<RenderPassCreateInfo, RenderPass> = c"vkCreateRenderPass",
        create_render_pass2: PfnCreate<RenderPassCreateInfo2, RenderPass> = c"vkCreateRenderPass2",
        destroy_render_pass: PfnDestroy<RenderPass> = c"vkDestroyRenderPass",
        create_sampler: PfnCreate<SamplerCreateInfo, Sampler> = c"vkCreateSampler",
        destroy_sampler: PfnDestroy<Sampler> = c"vkDestroySampler",
        create_sampler_ycbcr_conversion:
            PfnCreate<SamplerYcbcrConversionCreateInfo, SamplerYcbcrConversion>
            = c"vkCreateSamplerYcbcrConversion",
        destroy_sampler_ycbcr_conversion: PfnDestroy<SamplerYcbcrConversion>
            = c"vkDestroySamplerYcbcrConversion",
        create_shader_module: PfnCreate<ShaderModuleCreateInfo, ShaderModule> = c"vkCreateShaderModule",
        destroy_shader_module: PfnDestroy<ShaderModule> = c"vkDestroyShaderModule",
        create_command_pool: PfnCreate<CommandPoolCreateInfo, CommandPool> = c"vkCreateCommandPool",
        reset_command_pool: PfnResetCommandPool = c"vkResetCommandPool",
        destroy_command_pool: PfnDestroy<CommandPool> = c"vkDestroyCommandPool",
        allocate_command_buffers: PfnAllocateCommandBuffers = c"vkAllocateCommandBuffers",
        free_command_buffers: PfnFreeCommandBuffers = c"vkFreeCommandBuffers",
    }
}
