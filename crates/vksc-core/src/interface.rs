//! Device-level call surface.
//!
//! Every layer of the driver stack implements [`DeviceInterface`]: the plain
//! pass-through driver that forwards to resolved entry points, and the
//! intercepting driver that routes tracked calls by process mode. Creates
//! return handles by value; destroys of null or unknown handles are no-ops.

use crate::error::DriverResult;
use crate::handle::{
    CommandBuffer, CommandPool, DescriptorSetLayout, Device, ImageView, Pipeline, PipelineCache,
    PipelineLayout, QueryPool, RenderPass, Sampler, SamplerYcbcrConversion, ShaderModule,
};
use crate::info::{
    CommandBufferAllocateInfo, CommandPoolCreateInfo, ComputePipelineCreateInfo,
    DescriptorSetLayoutCreateInfo, DescriptorSetLayoutSupport, GraphicsPipelineCreateInfo,
    ImageViewCreateInfo, PipelineLayoutCreateInfo, QueryPoolCreateInfo, RenderPassCreateInfo,
    RenderPassCreateInfo2, SamplerCreateInfo, SamplerYcbcrConversionCreateInfo,
    ShaderModuleCreateInfo,
};

pub trait DeviceInterface: Send + Sync {
    fn destroy_device(&self, device: Device);

    fn create_descriptor_set_layout(
        &self,
        device: Device,
        info: &DescriptorSetLayoutCreateInfo,
    ) -> DriverResult<DescriptorSetLayout>;

    fn destroy_descriptor_set_layout(&self, device: Device, layout: DescriptorSetLayout);

    fn get_descriptor_set_layout_support(
        &self,
        device: Device,
        info: &DescriptorSetLayoutCreateInfo,
    ) -> DriverResult<DescriptorSetLayoutSupport>;

    fn create_image_view(&self, device: Device, info: &ImageViewCreateInfo)
    -> DriverResult<ImageView>;

    fn destroy_image_view(&self, device: Device, view: ImageView);

    fn create_query_pool(&self, device: Device, info: &QueryPoolCreateInfo)
    -> DriverResult<QueryPool>;

    fn destroy_query_pool(&self, device: Device, pool: QueryPool);

    fn create_pipeline_layout(
        &self,
        device: Device,
        info: &PipelineLayoutCreateInfo,
    ) -> DriverResult<PipelineLayout>;

    fn destroy_pipeline_layout(&self, device: Device, layout: PipelineLayout);

    /// Creates one pipeline per descriptor, in order.
    fn create_graphics_pipelines(
        &self,
        device: Device,
        cache: PipelineCache,
        infos: &[GraphicsPipelineCreateInfo],
    ) -> DriverResult<Vec<Pipeline>>;

    /// Creates one pipeline per descriptor, in order.
    fn create_compute_pipelines(
        &self,
        device: Device,
        cache: PipelineCache,
        infos: &[ComputePipelineCreateInfo],
    ) -> DriverResult<Vec<Pipeline>>;

    fn destroy_pipeline(&self, device: Device, pipeline: Pipeline);

    fn create_render_pass(&self, device: Device, info: &RenderPassCreateInfo)
    -> DriverResult<RenderPass>;

    fn create_render_pass2(
        &self,
        device: Device,
        info: &RenderPassCreateInfo2,
    ) -> DriverResult<RenderPass>;

    fn destroy_render_pass(&self, device: Device, render_pass: RenderPass);

    fn create_sampler(&self, device: Device, info: &SamplerCreateInfo) -> DriverResult<Sampler>;

    fn destroy_sampler(&self, device: Device, sampler: Sampler);

    fn create_sampler_ycbcr_conversion(
        &self,
        device: Device,
        info: &SamplerYcbcrConversionCreateInfo,
    ) -> DriverResult<SamplerYcbcrConversion>;

    fn destroy_sampler_ycbcr_conversion(&self, device: Device, conversion: SamplerYcbcrConversion);

    fn create_shader_module(
        &self,
        device: Device,
        info: &ShaderModuleCreateInfo,
    ) -> DriverResult<ShaderModule>;

    fn destroy_shader_module(&self, device: Device, module: ShaderModule);

    fn create_command_pool(
        &self,
        device: Device,
        info: &CommandPoolCreateInfo,
    ) -> DriverResult<CommandPool>;

    fn reset_command_pool(&self, device: Device, pool: CommandPool, flags: u32) -> DriverResult<()>;

    fn destroy_command_pool(&self, device: Device, pool: CommandPool);

    fn allocate_command_buffers(
        &self,
        device: Device,
        info: &CommandBufferAllocateInfo,
    ) -> DriverResult<Vec<CommandBuffer>>;

    fn free_command_buffers(&self, device: Device, pool: CommandPool, buffers: &[CommandBuffer]);
}
