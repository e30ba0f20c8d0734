//! Object shadow registry.
//!
//! Authoritative records of the create calls whose handles must be identical
//! between the gathering and replay passes. Each tracked kind has its own
//! store keyed by handle; hash-addressable kinds also register an
//! [`ObjectHash`] so later descriptors that reference them (pipeline layouts
//! referencing set layouts, samplers referencing conversions) hash by content
//! rather than by handle value.
//!
//! Destroying an unknown handle is a no-op. Query pools are never reclaimed.

use std::collections::{BTreeMap, HashMap};

use vksc_core::handle::{
    CommandBuffer, CommandPool, DescriptorSetLayout, ImageView, Pipeline, PipelineLayout,
    QueryPool, RawHandle, RenderPass, Sampler, SamplerYcbcrConversion,
};
use vksc_core::info::{
    CommandBufferLevel, CommandPoolCreateInfo, ComputePipelineCreateInfo,
    DescriptorSetLayoutCreateInfo, GraphicsPipelineCreateInfo, ImageViewCreateInfo,
    PipelineLayoutCreateInfo, QueryPoolCreateInfo, RenderPassCreateInfo, RenderPassCreateInfo2,
    SamplerCreateInfo, SamplerYcbcrConversionCreateInfo,
};
use vksc_core::object_hash::{self, ObjectHash, ObjectHashLookup};

/// Stored creation descriptor plus its hash, if the kind is hash-addressable.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord<I> {
    pub info: I,
    pub hash: Option<ObjectHash>,
}

/// Records of one kind, keyed by handle.
#[derive(Debug, Clone)]
pub struct ShadowStore<H, I> {
    records: BTreeMap<H, ObjectRecord<I>>,
}

impl<H: Ord + Copy, I> ShadowStore<H, I> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, handle: H) -> Option<&ObjectRecord<I>> {
        self.records.get(&handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Handles in ascending order.
    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.records.keys().copied()
    }

    fn insert(&mut self, handle: H, record: ObjectRecord<I>) {
        self.records.insert(handle, record);
    }

    fn remove(&mut self, handle: H) -> Option<ObjectRecord<I>> {
        self.records.remove(&handle)
    }

    fn clear(&mut self) {
        self.records.clear();
    }
}

impl<H: Ord + Copy, I> Default for ShadowStore<H, I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A creation descriptor the registry can shadow.
pub trait ShadowKind: Clone + Sized {
    type Handle: RawHandle;

    /// Whether a destroy removes the record. Kinds the target runtime never
    /// reclaims keep their record for the process lifetime.
    const RECLAIMED: bool = true;

    fn store(registry: &ShadowRegistry) -> &ShadowStore<Self::Handle, Self>;

    fn store_mut(registry: &mut ShadowRegistry) -> &mut ShadowStore<Self::Handle, Self>;

    /// Hash of this descriptor, for hash-addressable kinds.
    fn object_hash(&self, _hashes: &dyn ObjectHashLookup) -> Option<ObjectHash> {
        None
    }
}

/// Per-buffer record of an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandBufferRecord {
    pub command_pool: CommandPool,
    pub level: CommandBufferLevel,
}

macro_rules! shadow_kind {
    ($info:ty => $handle:ty, $field:ident $(, reclaimed = $reclaimed:expr)? $(, hash = $hash:path)?) => {
        impl ShadowKind for $info {
            type Handle = $handle;
            $(const RECLAIMED: bool = $reclaimed;)?

            fn store(registry: &ShadowRegistry) -> &ShadowStore<$handle, Self> {
                &registry.$field
            }

            fn store_mut(registry: &mut ShadowRegistry) -> &mut ShadowStore<$handle, Self> {
                &mut registry.$field
            }

            $(
                fn object_hash(&self, hashes: &dyn ObjectHashLookup) -> Option<ObjectHash> {
                    Some($hash(self, hashes))
                }
            )?
        }
    };
}

shadow_kind!(DescriptorSetLayoutCreateInfo => DescriptorSetLayout, descriptor_set_layouts,
    hash = object_hash::descriptor_set_layout_hash);
shadow_kind!(PipelineLayoutCreateInfo => PipelineLayout, pipeline_layouts,
    hash = object_hash::pipeline_layout_hash);
shadow_kind!(ImageViewCreateInfo => ImageView, image_views);
shadow_kind!(RenderPassCreateInfo => RenderPass, render_passes,
    hash = object_hash::render_pass_hash);
shadow_kind!(RenderPassCreateInfo2 => RenderPass, render_passes2,
    hash = object_hash::render_pass2_hash);
shadow_kind!(GraphicsPipelineCreateInfo => Pipeline, graphics_pipelines);
shadow_kind!(ComputePipelineCreateInfo => Pipeline, compute_pipelines);
shadow_kind!(SamplerCreateInfo => Sampler, samplers, hash = object_hash::sampler_hash);
shadow_kind!(SamplerYcbcrConversionCreateInfo => SamplerYcbcrConversion, ycbcr_conversions,
    hash = object_hash::sampler_ycbcr_conversion_hash);
shadow_kind!(QueryPoolCreateInfo => QueryPool, query_pools, reclaimed = false);
shadow_kind!(CommandPoolCreateInfo => CommandPool, command_pools);
shadow_kind!(CommandBufferRecord => CommandBuffer, command_buffers);

/// Per-device shadow stores plus the object hash table.
#[derive(Debug, Clone, Default)]
pub struct ShadowRegistry {
    descriptor_set_layouts: ShadowStore<DescriptorSetLayout, DescriptorSetLayoutCreateInfo>,
    pipeline_layouts: ShadowStore<PipelineLayout, PipelineLayoutCreateInfo>,
    image_views: ShadowStore<ImageView, ImageViewCreateInfo>,
    render_passes: ShadowStore<RenderPass, RenderPassCreateInfo>,
    render_passes2: ShadowStore<RenderPass, RenderPassCreateInfo2>,
    graphics_pipelines: ShadowStore<Pipeline, GraphicsPipelineCreateInfo>,
    compute_pipelines: ShadowStore<Pipeline, ComputePipelineCreateInfo>,
    samplers: ShadowStore<Sampler, SamplerCreateInfo>,
    ycbcr_conversions: ShadowStore<SamplerYcbcrConversion, SamplerYcbcrConversionCreateInfo>,
    query_pools: ShadowStore<QueryPool, QueryPoolCreateInfo>,
    command_pools: ShadowStore<CommandPool, CommandPoolCreateInfo>,
    command_buffers: ShadowStore<CommandBuffer, CommandBufferRecord>,
    object_hashes: HashMap<u64, ObjectHash>,
}

impl ShadowRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next handle from `next_handle` and shadow `info` under it.
    pub fn create_shadow<K: ShadowKind>(
        &mut self,
        next_handle: impl FnOnce() -> u64,
        info: K,
    ) -> K::Handle {
        let handle = K::Handle::from_raw(next_handle());
        self.insert_shadow(handle, info);
        handle
    }

    /// Shadow `info` under an already-issued handle. Returns the registered hash.
    pub fn insert_shadow<K: ShadowKind>(&mut self, handle: K::Handle, info: K) -> Option<ObjectHash> {
        let hash = info.object_hash(&self.object_hashes);
        if let Some(hash) = hash {
            self.object_hashes.insert(handle.as_raw(), hash);
        }
        K::store_mut(self).insert(handle, ObjectRecord { info, hash });
        hash
    }

    /// Remove the record for `handle`, returning its descriptor.
    ///
    /// Unknown handles, null handles and kinds that are never reclaimed return
    /// `None` and leave the registry untouched.
    pub fn destroy_shadow<K: ShadowKind>(&mut self, handle: K::Handle) -> Option<K> {
        if !K::RECLAIMED || handle.is_null() {
            return None;
        }
        K::store_mut(self).remove(handle).map(|record| record.info)
    }

    /// Register the hash of a driver-issued handle without shadowing the descriptor.
    pub fn register_object_hash<K: ShadowKind>(
        &mut self,
        handle: K::Handle,
        info: &K,
    ) -> Option<ObjectHash> {
        let hash = info.object_hash(&self.object_hashes)?;
        self.object_hashes.insert(handle.as_raw(), hash);
        Some(hash)
    }

    #[must_use]
    pub fn get<K: ShadowKind>(&self, handle: K::Handle) -> Option<&K> {
        K::store(self).get(handle).map(|record| &record.info)
    }

    #[must_use]
    pub fn contains<K: ShadowKind>(&self, handle: K::Handle) -> bool {
        K::store(self).get(handle).is_some()
    }

    /// Number of live records of kind `K`.
    #[must_use]
    pub fn count<K: ShadowKind>(&self) -> usize {
        K::store(self).len()
    }

    #[must_use]
    pub fn store<K: ShadowKind>(&self) -> &ShadowStore<K::Handle, K> {
        K::store(self)
    }

    /// Hash registered for a raw handle of any kind.
    #[must_use]
    pub fn object_hash(&self, raw_handle: u64) -> Option<ObjectHash> {
        self.object_hashes.get(&raw_handle).copied()
    }

    #[must_use]
    pub fn object_hashes(&self) -> &HashMap<u64, ObjectHash> {
        &self.object_hashes
    }

    /// Drop the records of every command buffer allocated from `pool`.
    /// Returns how many were dropped.
    pub fn release_command_buffers_of(&mut self, pool: CommandPool) -> usize {
        let before = self.command_buffers.len();
        self.command_buffers
            .records
            .retain(|_, record| record.info.command_pool != pool);
        before - self.command_buffers.len()
    }

    /// Total live records across every kind.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.descriptor_set_layouts.len()
            + self.pipeline_layouts.len()
            + self.image_views.len()
            + self.render_passes.len()
            + self.render_passes2.len()
            + self.graphics_pipelines.len()
            + self.compute_pipelines.len()
            + self.samplers.len()
            + self.ycbcr_conversions.len()
            + self.query_pools.len()
            + self.command_pools.len()
            + self.command_buffers.len()
    }

    /// Clear every store and the hash table.
    pub fn reset(&mut self) {
        self.descriptor_set_layouts.clear();
        self.pipeline_layouts.clear();
        self.image_views.clear();
        self.render_passes.clear();
        self.render_passes2.clear();
        self.graphics_pipelines.clear();
        self.compute_pipelines.clear();
        self.samplers.clear();
        self.ycbcr_conversions.clear();
        self.query_pools.clear();
        self.command_pools.clear();
        self.command_buffers.clear();
        self.object_hashes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vksc_core::info::{DescriptorSetLayoutBinding, DescriptorType, QueryType};

    fn counter(start: u64) -> impl FnMut() -> u64 {
        let mut next = start;
        move || {
            next += 1;
            next
        }
    }

    fn layout(bindings: u32) -> DescriptorSetLayoutCreateInfo {
        DescriptorSetLayoutCreateInfo {
            flags: 0,
            bindings: (0..bindings)
                .map(|i| DescriptorSetLayoutBinding {
                    binding: i,
                    descriptor_type: DescriptorType::UNIFORM_BUFFER,
                    descriptor_count: 1,
                    stage_flags: 1,
                    immutable_samplers: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn create_assigns_counter_handles() {
        let mut reg = ShadowRegistry::new();
        let mut next = counter(0);
        let a = reg.create_shadow(&mut next, ImageViewCreateInfo::default());
        let b = reg.create_shadow(&mut next, ImageViewCreateInfo::default());
        assert_eq!(a.as_raw(), 1);
        assert_eq!(b.as_raw(), 2);
        assert_eq!(reg.count::<ImageViewCreateInfo>(), 2);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut reg = ShadowRegistry::new();
        let view = reg.create_shadow(counter(10), ImageViewCreateInfo::default());
        assert!(reg.destroy_shadow::<ImageViewCreateInfo>(view).is_some());
        assert!(reg.destroy_shadow::<ImageViewCreateInfo>(view).is_none());
        assert!(reg
            .destroy_shadow::<ImageViewCreateInfo>(ImageView::from_raw(999))
            .is_none());
        assert!(reg
            .destroy_shadow::<ImageViewCreateInfo>(ImageView::null())
            .is_none());
        assert_eq!(reg.count::<ImageViewCreateInfo>(), 0);
    }

    #[test]
    fn query_pools_are_retained() {
        let mut reg = ShadowRegistry::new();
        let info = QueryPoolCreateInfo {
            query_type: QueryType::TIMESTAMP,
            query_count: 16,
            ..Default::default()
        };
        let pool = reg.create_shadow(counter(0), info.clone());
        assert!(reg.destroy_shadow::<QueryPoolCreateInfo>(pool).is_none());
        assert_eq!(reg.get::<QueryPoolCreateInfo>(pool), Some(&info));
    }

    #[test]
    fn layouts_register_hashes_and_feed_dependents() {
        let mut reg = ShadowRegistry::new();
        let mut next = counter(0);
        let set_layout = reg.create_shadow(&mut next, layout(2));
        let set_hash = reg.object_hash(set_layout.as_raw()).unwrap();

        let pipeline_layout = reg.create_shadow(
            &mut next,
            PipelineLayoutCreateInfo {
                flags: 0,
                set_layouts: vec![set_layout],
                push_constant_ranges: Vec::new(),
            },
        );
        let mut lookup = HashMap::new();
        lookup.insert(set_layout.as_raw(), set_hash);
        let expected = object_hash::pipeline_layout_hash(
            reg.get::<PipelineLayoutCreateInfo>(pipeline_layout).unwrap(),
            &lookup,
        );
        assert_eq!(reg.object_hash(pipeline_layout.as_raw()), Some(expected));
    }

    #[test]
    fn image_views_are_not_hash_addressable() {
        let mut reg = ShadowRegistry::new();
        let view = reg.create_shadow(counter(0), ImageViewCreateInfo::default());
        assert_eq!(reg.object_hash(view.as_raw()), None);
    }

    #[test]
    fn driver_issued_handles_can_register_hashes() {
        let mut reg = ShadowRegistry::new();
        let info = layout(1);
        let hash = reg.register_object_hash(DescriptorSetLayout::from_raw(0xdead), &info);
        assert_eq!(reg.object_hash(0xdead), hash);
        assert!(!reg.contains::<DescriptorSetLayoutCreateInfo>(DescriptorSetLayout::from_raw(0xdead)));
    }

    #[test]
    fn render_pass_generations_share_handle_space() {
        let mut reg = ShadowRegistry::new();
        let mut next = counter(0);
        let v1 = reg.create_shadow(&mut next, RenderPassCreateInfo::default());
        let v2 = reg.create_shadow(&mut next, RenderPassCreateInfo2::default());
        assert!(reg.destroy_shadow::<RenderPassCreateInfo>(v2).is_none());
        assert!(reg.destroy_shadow::<RenderPassCreateInfo2>(v2).is_some());
        assert!(reg.destroy_shadow::<RenderPassCreateInfo>(v1).is_some());
    }

    #[test]
    fn pool_destruction_releases_its_buffers() {
        let mut reg = ShadowRegistry::new();
        let mut next = counter(0);
        let pool_a = reg.create_shadow(&mut next, CommandPoolCreateInfo::default());
        let pool_b = reg.create_shadow(&mut next, CommandPoolCreateInfo::default());
        for pool in [pool_a, pool_a, pool_b] {
            reg.create_shadow(
                &mut next,
                CommandBufferRecord {
                    command_pool: pool,
                    level: CommandBufferLevel::PRIMARY,
                },
            );
        }
        assert_eq!(reg.release_command_buffers_of(pool_a), 2);
        assert_eq!(reg.count::<CommandBufferRecord>(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut reg = ShadowRegistry::new();
        let mut next = counter(0);
        reg.create_shadow(&mut next, layout(1));
        reg.create_shadow(&mut next, QueryPoolCreateInfo::default());
        reg.create_shadow(&mut next, ImageViewCreateInfo::default());
        assert_eq!(reg.total_records(), 3);
        reg.reset();
        assert_eq!(reg.total_records(), 0);
        assert!(reg.object_hashes().is_empty());
    }
}
