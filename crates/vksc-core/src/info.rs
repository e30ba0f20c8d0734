//! Owned creation descriptors for the object kinds the membrane intercepts.
//!
//! Descriptors own their arrays (`Vec`) instead of pointer/count pairs, and
//! extension chains that matter to the membrane are modelled as explicit
//! optional fields. Field order follows the driver API declaration order;
//! object hashing traverses fields in exactly this order.

use crate::handle::{
    CommandPool, DescriptorSetLayout, Image, Pipeline, PipelineLayout, RenderPass, Sampler,
    SamplerYcbcrConversion, ShaderModule,
};

macro_rules! vk_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:expr),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(pub i32);

        impl $name {
            $(pub const $variant: Self = Self($value);)*
        }
    };
}

vk_enum! {
    /// Descriptor binding type.
    DescriptorType {
        SAMPLER = 0,
        COMBINED_IMAGE_SAMPLER = 1,
        SAMPLED_IMAGE = 2,
        STORAGE_IMAGE = 3,
        UNIFORM_TEXEL_BUFFER = 4,
        STORAGE_TEXEL_BUFFER = 5,
        UNIFORM_BUFFER = 6,
        STORAGE_BUFFER = 7,
        UNIFORM_BUFFER_DYNAMIC = 8,
        STORAGE_BUFFER_DYNAMIC = 9,
        INPUT_ATTACHMENT = 10,
    }
}

vk_enum! {
    /// Query pool type.
    QueryType {
        OCCLUSION = 0,
        PIPELINE_STATISTICS = 1,
        TIMESTAMP = 2,
    }
}

vk_enum! {
    /// Command buffer level.
    CommandBufferLevel {
        PRIMARY = 0,
        SECONDARY = 1,
    }
}

// ---------------------------------------------------------------------------
// Descriptor set layouts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub descriptor_count: u32,
    pub stage_flags: u32,
    /// Immutable samplers; empty when the binding has none.
    pub immutable_samplers: Vec<Sampler>,
}

impl DescriptorSetLayoutBinding {
    /// Whether this binding contributes immutable samplers to its layout.
    #[must_use]
    pub fn has_immutable_samplers(&self) -> bool {
        matches!(
            self.descriptor_type,
            DescriptorType::SAMPLER | DescriptorType::COMBINED_IMAGE_SAMPLER
        ) && !self.immutable_samplers.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSetLayoutCreateInfo {
    pub flags: u32,
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorSetLayoutSupport {
    pub supported: bool,
}

// ---------------------------------------------------------------------------
// Image views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComponentMapping {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ImageSubresourceRange {
    pub aspect_mask: u32,
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageViewCreateInfo {
    pub flags: u32,
    pub image: Image,
    pub view_type: i32,
    pub format: i32,
    pub components: ComponentMapping,
    pub subresource_range: ImageSubresourceRange,
}

impl ImageViewCreateInfo {
    /// Views over more than one array layer count as layered.
    #[must_use]
    pub const fn is_layered(&self) -> bool {
        self.subresource_range.layer_count > 1
    }
}

// ---------------------------------------------------------------------------
// Query pools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPoolCreateInfo {
    pub flags: u32,
    pub query_type: QueryType,
    pub query_count: u32,
    pub pipeline_statistics: u32,
}

// ---------------------------------------------------------------------------
// Pipeline layouts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PushConstantRange {
    pub stage_flags: u32,
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineLayoutCreateInfo {
    pub flags: u32,
    pub set_layouts: Vec<DescriptorSetLayout>,
    pub push_constant_ranges: Vec<PushConstantRange>,
}

// ---------------------------------------------------------------------------
// Render passes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AttachmentDescription {
    pub flags: u32,
    pub format: i32,
    pub samples: u32,
    pub load_op: i32,
    pub store_op: i32,
    pub stencil_load_op: i32,
    pub stencil_store_op: i32,
    pub initial_layout: i32,
    pub final_layout: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AttachmentReference {
    pub attachment: u32,
    pub layout: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubpassDescription {
    pub flags: u32,
    pub pipeline_bind_point: i32,
    pub input_attachments: Vec<AttachmentReference>,
    pub color_attachments: Vec<AttachmentReference>,
    pub resolve_attachments: Vec<AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
    pub preserve_attachments: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: u32,
    pub dst_stage_mask: u32,
    pub src_access_mask: u32,
    pub dst_access_mask: u32,
    pub dependency_flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderPassCreateInfo {
    pub flags: u32,
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription>,
    pub dependencies: Vec<SubpassDependency>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AttachmentReference2 {
    pub attachment: u32,
    pub layout: i32,
    pub aspect_mask: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubpassDescription2 {
    pub flags: u32,
    pub pipeline_bind_point: i32,
    pub view_mask: u32,
    pub input_attachments: Vec<AttachmentReference2>,
    pub color_attachments: Vec<AttachmentReference2>,
    pub resolve_attachments: Vec<AttachmentReference2>,
    pub depth_stencil_attachment: Option<AttachmentReference2>,
    pub preserve_attachments: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SubpassDependency2 {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: u32,
    pub dst_stage_mask: u32,
    pub src_access_mask: u32,
    pub dst_access_mask: u32,
    pub dependency_flags: u32,
    pub view_offset: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderPassCreateInfo2 {
    pub flags: u32,
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription2>,
    pub dependencies: Vec<SubpassDependency2>,
    pub correlated_view_masks: Vec<u32>,
}

// ---------------------------------------------------------------------------
// Samplers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplerCreateInfo {
    pub flags: u32,
    pub mag_filter: i32,
    pub min_filter: i32,
    pub mipmap_mode: i32,
    pub address_mode_u: i32,
    pub address_mode_v: i32,
    pub address_mode_w: i32,
    pub mip_lod_bias: f32,
    pub anisotropy_enable: bool,
    pub max_anisotropy: f32,
    pub compare_enable: bool,
    pub compare_op: i32,
    pub min_lod: f32,
    pub max_lod: f32,
    pub border_color: i32,
    pub unnormalized_coordinates: bool,
    /// Chained Y'CbCr conversion, if any.
    pub ycbcr_conversion: Option<SamplerYcbcrConversion>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerYcbcrConversionCreateInfo {
    pub format: i32,
    pub ycbcr_model: i32,
    pub ycbcr_range: i32,
    pub components: ComponentMapping,
    pub x_chroma_offset: i32,
    pub y_chroma_offset: i32,
    pub chroma_filter: i32,
    pub force_explicit_reconstruction: bool,
}

// ---------------------------------------------------------------------------
// Shader modules and pipelines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderModuleCreateInfo {
    pub flags: u32,
    /// SPIR-V words.
    pub code: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineShaderStageCreateInfo {
    pub flags: u32,
    pub stage: u32,
    pub module: ShaderModule,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphicsPipelineCreateInfo {
    pub flags: u32,
    pub stages: Vec<PipelineShaderStageCreateInfo>,
    pub layout: PipelineLayout,
    pub render_pass: RenderPass,
    pub subpass: u32,
    pub base_pipeline_handle: Pipeline,
    pub base_pipeline_index: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputePipelineCreateInfo {
    pub flags: u32,
    pub stage: PipelineShaderStageCreateInfo,
    pub layout: PipelineLayout,
    pub base_pipeline_handle: Pipeline,
    pub base_pipeline_index: i32,
}

// ---------------------------------------------------------------------------
// Command pools and buffers
// ---------------------------------------------------------------------------

/// Memory reservation chained onto command-pool creation in the replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CommandPoolMemoryReservationCreateInfo {
    pub command_pool_reserved_size: u64,
    pub command_pool_max_command_buffers: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPoolCreateInfo {
    pub flags: u32,
    pub queue_family_index: u32,
    pub memory_reservation: Option<CommandPoolMemoryReservationCreateInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBufferAllocateInfo {
    pub command_pool: CommandPool,
    pub level: CommandBufferLevel,
    pub command_buffer_count: u32,
}

// ---------------------------------------------------------------------------
// Instances and devices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceCreateInfo {
    pub application_name: String,
    pub api_version: u32,
    pub enabled_layer_names: Vec<String>,
    pub enabled_extension_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceQueueCreateInfo {
    pub flags: u32,
    pub queue_family_index: u32,
    pub queue_priorities: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceCreateInfo {
    pub flags: u32,
    pub queue_create_infos: Vec<DeviceQueueCreateInfo>,
    pub enabled_extension_names: Vec<String>,
    /// Names of the enabled physical-device features.
    pub enabled_feature_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immutable_samplers_only_count_for_sampler_types() {
        let mut binding = DescriptorSetLayoutBinding {
            binding: 0,
            descriptor_type: DescriptorType::UNIFORM_BUFFER,
            descriptor_count: 2,
            stage_flags: 0,
            immutable_samplers: vec![Sampler::from_raw(1), Sampler::from_raw(2)],
        };
        assert!(!binding.has_immutable_samplers());
        binding.descriptor_type = DescriptorType::COMBINED_IMAGE_SAMPLER;
        assert!(binding.has_immutable_samplers());
        binding.immutable_samplers.clear();
        assert!(!binding.has_immutable_samplers());
    }

    #[test]
    fn layered_views() {
        let mut info = ImageViewCreateInfo::default();
        info.subresource_range.layer_count = 1;
        assert!(!info.is_layered());
        info.subresource_range.layer_count = 4;
        assert!(info.is_layered());
    }
}
