//! Typed object handles.
//!
//! Every handle is a transparent 64-bit value so it can cross the driver ABI
//! unchanged. Zero is the null handle for every kind. Synthetic handles issued
//! during the gathering pass use the same representation as driver-issued ones.

use serde::{Deserialize, Serialize};

/// Object kinds the membrane knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Instance,
    PhysicalDevice,
    Device,
    Image,
    ImageView,
    DescriptorSetLayout,
    PipelineLayout,
    PipelineCache,
    Pipeline,
    RenderPass,
    Sampler,
    SamplerYcbcrConversion,
    ShaderModule,
    QueryPool,
    CommandPool,
    CommandBuffer,
}

impl ObjectKind {
    /// Stable lowercase name used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::PhysicalDevice => "physical_device",
            Self::Device => "device",
            Self::Image => "image",
            Self::ImageView => "image_view",
            Self::DescriptorSetLayout => "descriptor_set_layout",
            Self::PipelineLayout => "pipeline_layout",
            Self::PipelineCache => "pipeline_cache",
            Self::Pipeline => "pipeline",
            Self::RenderPass => "render_pass",
            Self::Sampler => "sampler",
            Self::SamplerYcbcrConversion => "sampler_ycbcr_conversion",
            Self::ShaderModule => "shader_module",
            Self::QueryPool => "query_pool",
            Self::CommandPool => "command_pool",
            Self::CommandBuffer => "command_buffer",
        }
    }
}

/// Common surface of every typed handle.
pub trait RawHandle: Copy + Eq + Ord + std::hash::Hash + std::fmt::Debug {
    /// Kind of object this handle names.
    const KIND: ObjectKind;

    /// Wrap a raw 64-bit value.
    fn from_raw(raw: u64) -> Self;

    /// The raw 64-bit value.
    fn as_raw(self) -> u64;

    /// The null handle.
    #[must_use]
    fn null() -> Self {
        Self::from_raw(0)
    }

    /// Returns true for the null handle.
    fn is_null(self) -> bool {
        self.as_raw() == 0
    }
}

macro_rules! define_handles {
    ($( $(#[$meta:meta])* $name:ident => $kind:ident ),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
            #[repr(transparent)]
            pub struct $name(u64);

            impl $name {
                /// Wrap a raw 64-bit value.
                #[must_use]
                pub const fn from_raw(raw: u64) -> Self {
                    Self(raw)
                }

                /// The raw 64-bit value.
                #[must_use]
                pub const fn as_raw(self) -> u64 {
                    self.0
                }

                /// The null handle.
                #[must_use]
                pub const fn null() -> Self {
                    Self(0)
                }

                /// Returns true for the null handle.
                #[must_use]
                pub const fn is_null(self) -> bool {
                    self.0 == 0
                }
            }

            impl RawHandle for $name {
                const KIND: ObjectKind = ObjectKind::$kind;

                fn from_raw(raw: u64) -> Self {
                    Self(raw)
                }

                fn as_raw(self) -> u64 {
                    self.0
                }
            }
        )*
    };
}

define_handles! {
    /// Dispatchable instance handle.
    Instance => Instance,
    /// Dispatchable physical-device handle.
    PhysicalDevice => PhysicalDevice,
    /// Dispatchable logical-device handle.
    Device => Device,
    Image => Image,
    ImageView => ImageView,
    DescriptorSetLayout => DescriptorSetLayout,
    PipelineLayout => PipelineLayout,
    PipelineCache => PipelineCache,
    Pipeline => Pipeline,
    RenderPass => RenderPass,
    Sampler => Sampler,
    SamplerYcbcrConversion => SamplerYcbcrConversion,
    ShaderModule => ShaderModule,
    QueryPool => QueryPool,
    CommandPool => CommandPool,
    /// Dispatchable command-buffer handle.
    CommandBuffer => CommandBuffer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handles() {
        assert!(ImageView::null().is_null());
        assert!(!ImageView::from_raw(7).is_null());
        assert_eq!(<Pipeline as RawHandle>::null(), Pipeline::default());
    }

    #[test]
    fn kinds_are_attached() {
        assert_eq!(<QueryPool as RawHandle>::KIND, ObjectKind::QueryPool);
        assert_eq!(ObjectKind::SamplerYcbcrConversion.as_str(), "sampler_ycbcr_conversion");
    }

    #[test]
    fn handles_order_by_raw_value() {
        let mut views = vec![ImageView::from_raw(9), ImageView::from_raw(3)];
        views.sort();
        assert_eq!(views[0].as_raw(), 3);
    }
}
