//! Deterministic fingerprints of creation descriptors.
//!
//! Hashes are BLAKE3 over a kind tag and the descriptor's fields in declaration
//! order, truncated to 64 bits. Sequences are length-prefixed. Objects a
//! descriptor references (set layouts, immutable samplers, Y'CbCr conversions)
//! contribute their own registered hash, so structurally identical layouts
//! built from structurally identical dependencies hash identically even when
//! their handles differ between passes.
//!
//! Traversal is order-sensitive: reordering bindings changes the hash.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::info::{
    AttachmentDescription, AttachmentReference, AttachmentReference2, ComponentMapping,
    DescriptorSetLayoutCreateInfo, PipelineLayoutCreateInfo, RenderPassCreateInfo,
    RenderPassCreateInfo2, SamplerCreateInfo, SamplerYcbcrConversionCreateInfo,
    ShaderModuleCreateInfo,
};

/// 64-bit fingerprint of a creation descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHash(pub u64);

/// Lookup of previously registered hashes by raw handle.
pub trait ObjectHashLookup {
    fn lookup(&self, raw_handle: u64) -> Option<ObjectHash>;
}

impl ObjectHashLookup for HashMap<u64, ObjectHash> {
    fn lookup(&self, raw_handle: u64) -> Option<ObjectHash> {
        self.get(&raw_handle).copied()
    }
}

impl ObjectHashLookup for BTreeMap<u64, ObjectHash> {
    fn lookup(&self, raw_handle: u64) -> Option<ObjectHash> {
        self.get(&raw_handle).copied()
    }
}

// Dependency markers.
const DEP_NULL: u8 = 0;
const DEP_KNOWN: u8 = 1;
const DEP_UNKNOWN: u8 = 2;

struct HashFeed {
    hasher: blake3::Hasher,
}

impl HashFeed {
    fn new(tag: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(tag.as_bytes());
        hasher.update(&[0]);
        Self { hasher }
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.hasher.update(&[v]);
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.hasher.update(&v.to_le_bytes());
        self
    }

    fn i32(&mut self, v: i32) -> &mut Self {
        self.hasher.update(&v.to_le_bytes());
        self
    }

    fn u64(&mut self, v: u64) -> &mut Self {
        self.hasher.update(&v.to_le_bytes());
        self
    }

    fn f32(&mut self, v: f32) -> &mut Self {
        self.u32(v.to_bits())
    }

    fn bool(&mut self, v: bool) -> &mut Self {
        self.u8(u8::from(v))
    }

    fn len(&mut self, n: usize) -> &mut Self {
        self.u64(n as u64)
    }

    fn dependency(&mut self, raw_handle: u64, hashes: &dyn ObjectHashLookup) -> &mut Self {
        if raw_handle == 0 {
            return self.u8(DEP_NULL);
        }
        match hashes.lookup(raw_handle) {
            Some(ObjectHash(h)) => self.u8(DEP_KNOWN).u64(h),
            None => self.u8(DEP_UNKNOWN),
        }
    }

    fn components(&mut self, c: &ComponentMapping) -> &mut Self {
        self.i32(c.r).i32(c.g).i32(c.b).i32(c.a)
    }

    fn attachment(&mut self, a: &AttachmentDescription) -> &mut Self {
        self.u32(a.flags)
            .i32(a.format)
            .u32(a.samples)
            .i32(a.load_op)
            .i32(a.store_op)
            .i32(a.stencil_load_op)
            .i32(a.stencil_store_op)
            .i32(a.initial_layout)
            .i32(a.final_layout)
    }

    fn references(&mut self, refs: &[AttachmentReference]) -> &mut Self {
        self.len(refs.len());
        for r in refs {
            self.u32(r.attachment).i32(r.layout);
        }
        self
    }

    fn references2(&mut self, refs: &[AttachmentReference2]) -> &mut Self {
        self.len(refs.len());
        for r in refs {
            self.u32(r.attachment).i32(r.layout).u32(r.aspect_mask);
        }
        self
    }

    fn finish(&self) -> ObjectHash {
        let digest = self.hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        ObjectHash(u64::from_le_bytes(head))
    }
}

/// Hash of a descriptor set layout. Immutable samplers contribute their own hashes.
#[must_use]
pub fn descriptor_set_layout_hash(
    info: &DescriptorSetLayoutCreateInfo,
    hashes: &dyn ObjectHashLookup,
) -> ObjectHash {
    let mut feed = HashFeed::new("descriptor_set_layout");
    feed.u32(info.flags).len(info.bindings.len());
    for binding in &info.bindings {
        feed.u32(binding.binding)
            .i32(binding.descriptor_type.0)
            .u32(binding.descriptor_count)
            .u32(binding.stage_flags)
            .len(binding.immutable_samplers.len());
        for sampler in &binding.immutable_samplers {
            feed.dependency(sampler.as_raw(), hashes);
        }
    }
    feed.finish()
}

/// Hash of a pipeline layout. Referenced set layouts contribute their own hashes.
#[must_use]
pub fn pipeline_layout_hash(
    info: &PipelineLayoutCreateInfo,
    hashes: &dyn ObjectHashLookup,
) -> ObjectHash {
    let mut feed = HashFeed::new("pipeline_layout");
    feed.u32(info.flags).len(info.set_layouts.len());
    for layout in &info.set_layouts {
        feed.dependency(layout.as_raw(), hashes);
    }
    feed.len(info.push_constant_ranges.len());
    for range in &info.push_constant_ranges {
        feed.u32(range.stage_flags).u32(range.offset).u32(range.size);
    }
    feed.finish()
}

/// Hash of a render pass.
#[must_use]
pub fn render_pass_hash(info: &RenderPassCreateInfo, _hashes: &dyn ObjectHashLookup) -> ObjectHash {
    let mut feed = HashFeed::new("render_pass");
    feed.u32(info.flags).len(info.attachments.len());
    for attachment in &info.attachments {
        feed.attachment(attachment);
    }
    feed.len(info.subpasses.len());
    for subpass in &info.subpasses {
        feed.u32(subpass.flags)
            .i32(subpass.pipeline_bind_point)
            .references(&subpass.input_attachments)
            .references(&subpass.color_attachments)
            .references(&subpass.resolve_attachments);
        match &subpass.depth_stencil_attachment {
            Some(ds) => feed.u8(1).u32(ds.attachment).i32(ds.layout),
            None => feed.u8(0),
        };
        feed.len(subpass.preserve_attachments.len());
        for preserve in &subpass.preserve_attachments {
            feed.u32(*preserve);
        }
    }
    feed.len(info.dependencies.len());
    for dep in &info.dependencies {
        feed.u32(dep.src_subpass)
            .u32(dep.dst_subpass)
            .u32(dep.src_stage_mask)
            .u32(dep.dst_stage_mask)
            .u32(dep.src_access_mask)
            .u32(dep.dst_access_mask)
            .u32(dep.dependency_flags);
    }
    feed.finish()
}

/// Hash of a render pass created through the second-generation entry point.
#[must_use]
pub fn render_pass2_hash(
    info: &RenderPassCreateInfo2,
    _hashes: &dyn ObjectHashLookup,
) -> ObjectHash {
    let mut feed = HashFeed::new("render_pass2");
    feed.u32(info.flags).len(info.attachments.len());
    for attachment in &info.attachments {
        feed.attachment(attachment);
    }
    feed.len(info.subpasses.len());
    for subpass in &info.subpasses {
        feed.u32(subpass.flags)
            .i32(subpass.pipeline_bind_point)
            .u32(subpass.view_mask)
            .references2(&subpass.input_attachments)
            .references2(&subpass.color_attachments)
            .references2(&subpass.resolve_attachments);
        match &subpass.depth_stencil_attachment {
            Some(ds) => feed.u8(1).u32(ds.attachment).i32(ds.layout).u32(ds.aspect_mask),
            None => feed.u8(0),
        };
        feed.len(subpass.preserve_attachments.len());
        for preserve in &subpass.preserve_attachments {
            feed.u32(*preserve);
        }
    }
    feed.len(info.dependencies.len());
    for dep in &info.dependencies {
        feed.u32(dep.src_subpass)
            .u32(dep.dst_subpass)
            .u32(dep.src_stage_mask)
            .u32(dep.dst_stage_mask)
            .u32(dep.src_access_mask)
            .u32(dep.dst_access_mask)
            .u32(dep.dependency_flags)
            .i32(dep.view_offset);
    }
    feed.len(info.correlated_view_masks.len());
    for mask in &info.correlated_view_masks {
        feed.u32(*mask);
    }
    feed.finish()
}

/// Hash of a sampler. A chained Y'CbCr conversion contributes its own hash.
#[must_use]
pub fn sampler_hash(info: &SamplerCreateInfo, hashes: &dyn ObjectHashLookup) -> ObjectHash {
    let mut feed = HashFeed::new("sampler");
    feed.u32(info.flags)
        .i32(info.mag_filter)
        .i32(info.min_filter)
        .i32(info.mipmap_mode)
        .i32(info.address_mode_u)
        .i32(info.address_mode_v)
        .i32(info.address_mode_w)
        .f32(info.mip_lod_bias)
        .bool(info.anisotropy_enable)
        .f32(info.max_anisotropy)
        .bool(info.compare_enable)
        .i32(info.compare_op)
        .f32(info.min_lod)
        .f32(info.max_lod)
        .i32(info.border_color)
        .bool(info.unnormalized_coordinates);
    match info.ycbcr_conversion {
        Some(conversion) => feed.u8(1).dependency(conversion.as_raw(), hashes),
        None => feed.u8(0),
    };
    feed.finish()
}

/// Hash of a sampler Y'CbCr conversion.
#[must_use]
pub fn sampler_ycbcr_conversion_hash(
    info: &SamplerYcbcrConversionCreateInfo,
    _hashes: &dyn ObjectHashLookup,
) -> ObjectHash {
    let mut feed = HashFeed::new("sampler_ycbcr_conversion");
    feed.i32(info.format)
        .i32(info.ycbcr_model)
        .i32(info.ycbcr_range)
        .components(&info.components)
        .i32(info.x_chroma_offset)
        .i32(info.y_chroma_offset)
        .i32(info.chroma_filter)
        .bool(info.force_explicit_reconstruction);
    feed.finish()
}

/// Fingerprint of shader module code.
#[must_use]
pub fn shader_module_hash(info: &ShaderModuleCreateInfo) -> ObjectHash {
    let mut feed = HashFeed::new("shader_module");
    feed.u32(info.flags).len(info.code.len());
    for word in &info.code {
        feed.u32(*word);
    }
    feed.finish()
}
