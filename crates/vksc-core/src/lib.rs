//! # vksc-core
//!
//! Pure data model shared by the Vulkan SC driver membrane.
//!
//! - **Result codes** (`result`): FFI-compatible `VkResult` with named codes
//! - **Errors** (`error`): the `DriverError` taxonomy every layer propagates
//! - **Handles** (`handle`): typed, transparent 64-bit object handles
//! - **Descriptors** (`info`): owned creation descriptors for the tracked kinds
//! - **Object hashes** (`object_hash`): deterministic descriptor fingerprints
//! - **Dispatch** (`interface`): the device-level call surface every driver
//!   layer implements

#![deny(unsafe_code)]

pub mod error;
pub mod handle;
pub mod info;
pub mod interface;
pub mod object_hash;
pub mod result;

pub use error::{DriverError, DriverResult};
pub use handle::{
    CommandBuffer, CommandPool, DescriptorSetLayout, Device, Image, ImageView, Instance,
    ObjectKind, PhysicalDevice, Pipeline, PipelineCache, PipelineLayout, QueryPool, RawHandle,
    RenderPass, Sampler, SamplerYcbcrConversion, ShaderModule,
};
pub use interface::DeviceInterface;
pub use object_hash::{ObjectHash, ObjectHashLookup};
pub use result::VkResult;
