//! Per-metric "current" and "maximum observed" counters.
//!
//! Counted metrics move with creates and destroys; the maximum table holds
//! their high-water mark. High-water metrics (largest view layer count, most
//! queries per pool, ...) live only in the maximum table.
//!
//! The recorder itself is not synchronised: the per-device ledger holds it
//! behind the same lock as the shadow registry so a single intercepted call
//! updates cooperating metrics as one unit.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! metrics {
    (@counted counted) => { true };
    (@counted high_water) => { false };
    ($( $(#[$meta:meta])* $variant:ident = $name:literal : $class:ident ),* $(,)?) => {
        /// Identifier of a tracked statistic.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Metric {
            $( $(#[$meta])* $variant, )*
        }

        impl Metric {
            /// Every metric, in table order.
            pub const ALL: &'static [Metric] = &[$(Metric::$variant),*];

            /// Number of metrics.
            pub const COUNT: usize = Self::ALL.len();

            /// Reservation field name of this metric.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Metric::$variant => $name,)*
                }
            }

            /// Whether this metric moves with creates and destroys (as opposed to
            /// a pure high-water mark).
            #[must_use]
            pub const fn is_counted(self) -> bool {
                match self {
                    $(Metric::$variant => metrics!(@counted $class),)*
                }
            }
        }
    };
}

metrics! {
    DescriptorSetLayoutRequestCount = "descriptorSetLayoutRequestCount": counted,
    DescriptorSetLayoutBindingRequestCount = "descriptorSetLayoutBindingRequestCount": counted,
    DescriptorSetLayoutBindingLimit = "descriptorSetLayoutBindingLimit": high_water,
    MaxImmutableSamplersPerDescriptorSetLayout = "maxImmutableSamplersPerDescriptorSetLayout": high_water,
    ImageViewRequestCount = "imageViewRequestCount": counted,
    LayeredImageViewRequestCount = "layeredImageViewRequestCount": counted,
    MaxImageViewMipLevels = "maxImageViewMipLevels": high_water,
    MaxImageViewArrayLayers = "maxImageViewArrayLayers": high_water,
    MaxLayeredImageViewMipLevels = "maxLayeredImageViewMipLevels": high_water,
    QueryPoolRequestCount = "queryPoolRequestCount": counted,
    MaxOcclusionQueriesPerPool = "maxOcclusionQueriesPerPool": high_water,
    MaxPipelineStatisticsQueriesPerPool = "maxPipelineStatisticsQueriesPerPool": high_water,
    MaxTimestampQueriesPerPool = "maxTimestampQueriesPerPool": high_water,
    PipelineLayoutRequestCount = "pipelineLayoutRequestCount": counted,
    GraphicsPipelineRequestCount = "graphicsPipelineRequestCount": counted,
    ComputePipelineRequestCount = "computePipelineRequestCount": counted,
    RenderPassRequestCount = "renderPassRequestCount": counted,
    SubpassDescriptionRequestCount = "subpassDescriptionRequestCount": counted,
    AttachmentDescriptionRequestCount = "attachmentDescriptionRequestCount": counted,
    SamplerRequestCount = "samplerRequestCount": counted,
    SamplerYcbcrConversionRequestCount = "samplerYcbcrConversionRequestCount": counted,
    CommandPoolRequestCount = "commandPoolRequestCount": counted,
    CommandBufferRequestCount = "commandBufferRequestCount": counted,
}

impl Metric {
    /// Look a metric up by its reservation field name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.name() == name)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u64>", into = "BTreeMap<String, u64>")]
pub struct MetricTable {
    values: [u64; Metric::COUNT],
}

impl MetricTable {
    /// All-zero table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: [0; Metric::COUNT],
        }
    }

    #[must_use]
    pub const fn get(&self, metric: Metric) -> u64 {
        self.values[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: u64) {
        self.values[metric.index()] = value;
    }

    /// (metric, value) pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, u64)> + '_ {
        Metric::ALL.iter().map(|m| (*m, self.get(*m)))
    }
}

impl Default for MetricTable {
    fn default() -> Self {
        Self::new()
    }
}

impl From<MetricTable> for BTreeMap<String, u64> {
    fn from(table: MetricTable) -> Self {
        table
            .iter()
            .map(|(metric, value)| (metric.name().to_string(), value))
            .collect()
    }
}

/// Name of a metric the table does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetric(pub String);

impl fmt::Display for UnknownMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown metric '{}'", self.0)
    }
}

impl std::error::Error for UnknownMetric {}

impl TryFrom<BTreeMap<String, u64>> for MetricTable {
    type Error = UnknownMetric;

    fn try_from(map: BTreeMap<String, u64>) -> Result<Self, Self::Error> {
        let mut table = Self::new();
        for (name, value) in map {
            let metric = Metric::from_name(&name).ok_or(UnknownMetric(name))?;
            table.set(metric, value);
        }
        Ok(table)
    }
}

/// Current and maximum-observed counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatisticsRecorder {
    current: MetricTable,
    max: MetricTable,
}

impl StatisticsRecorder {
    /// Zeroed recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: MetricTable::new(),
            max: MetricTable::new(),
        }
    }

    /// Add `delta` to the current value and raise the maximum to match.
    pub fn record_create(&mut self, metric: Metric, delta: u64) {
        let current = self.current.get(metric).saturating_add(delta);
        self.current.set(metric, current);
        if current > self.max.get(metric) {
            self.max.set(metric, current);
        }
    }

    /// Subtract `delta` from the current value. The maximum is never touched.
    ///
    /// Returns false (and clamps at zero) when `delta` exceeds the current
    /// value, which means a destroy was matched against an untracked create.
    pub fn record_destroy(&mut self, metric: Metric, delta: u64) -> bool {
        let current = self.current.get(metric);
        debug_assert!(
            current >= delta,
            "{metric} would drop below zero ({current} - {delta})"
        );
        match current.checked_sub(delta) {
            Some(next) => {
                self.current.set(metric, next);
                true
            }
            None => {
                self.current.set(metric, 0);
                false
            }
        }
    }

    /// Raise a high-water mark to at least `value`.
    pub fn raise_max(&mut self, metric: Metric, value: u64) {
        if value > self.max.get(metric) {
            self.max.set(metric, value);
        }
    }

    #[must_use]
    pub const fn current(&self, metric: Metric) -> u64 {
        self.current.get(metric)
    }

    #[must_use]
    pub const fn maximum(&self, metric: Metric) -> u64 {
        self.max.get(metric)
    }

    /// Copy of both tables as of the last completed update.
    #[must_use]
    pub const fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            current: self.current,
            max: self.max,
        }
    }

    /// Zero both tables.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

/// Point-in-time copy of the recorder, consumed by reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub current: MetricTable,
    pub max: MetricTable,
}

impl StatisticsSnapshot {
    /// Combine the snapshots of two devices that lived in the same gathering pass.
    ///
    /// Current counts add up. Each maximum is the larger of the two maxima,
    /// raised to the summed current value so that `max >= current` still holds
    /// for the merged snapshot.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut out = *self;
        for metric in Metric::ALL.iter().copied() {
            let current = self
                .current
                .get(metric)
                .saturating_add(other.current.get(metric));
            let max = self.max.get(metric).max(other.max.get(metric)).max(current);
            out.current.set(metric, current);
            out.max.set(metric, max);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_round_trip() {
        for metric in Metric::ALL.iter().copied() {
            assert_eq!(Metric::from_name(metric.name()), Some(metric));
        }
        assert_eq!(Metric::from_name("bogus"), None);
        assert_eq!(Metric::COUNT, 23);
    }

    #[test]
    fn create_raises_maximum() {
        let mut rec = StatisticsRecorder::new();
        rec.record_create(Metric::ImageViewRequestCount, 3);
        assert_eq!(rec.current(Metric::ImageViewRequestCount), 3);
        assert_eq!(rec.maximum(Metric::ImageViewRequestCount), 3);
    }

    #[test]
    fn destroy_leaves_maximum() {
        let mut rec = StatisticsRecorder::new();
        rec.record_create(Metric::SamplerRequestCount, 2);
        assert!(rec.record_destroy(Metric::SamplerRequestCount, 1));
        assert_eq!(rec.current(Metric::SamplerRequestCount), 1);
        assert_eq!(rec.maximum(Metric::SamplerRequestCount), 2);
        rec.record_create(Metric::SamplerRequestCount, 1);
        assert_eq!(rec.maximum(Metric::SamplerRequestCount), 2);
        rec.record_create(Metric::SamplerRequestCount, 1);
        assert_eq!(rec.maximum(Metric::SamplerRequestCount), 3);
    }

    #[test]
    fn high_water_marks_only_rise() {
        let mut rec = StatisticsRecorder::new();
        rec.raise_max(Metric::MaxImageViewArrayLayers, 4);
        rec.raise_max(Metric::MaxImageViewArrayLayers, 2);
        assert_eq!(rec.maximum(Metric::MaxImageViewArrayLayers), 4);
        assert_eq!(rec.current(Metric::MaxImageViewArrayLayers), 0);
        assert!(!Metric::MaxImageViewArrayLayers.is_counted());
        assert!(Metric::ImageViewRequestCount.is_counted());
    }

    #[test]
    fn snapshot_serializes_by_name() {
        let mut rec = StatisticsRecorder::new();
        rec.record_create(Metric::RenderPassRequestCount, 1);
        let json = serde_json::to_value(rec.snapshot()).unwrap();
        assert_eq!(json["current"]["renderPassRequestCount"], 1);
        assert_eq!(json["max"]["renderPassRequestCount"], 1);
        let back: StatisticsSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec.snapshot());
    }

    #[test]
    fn unknown_metric_names_are_rejected() {
        let json = serde_json::json!({"current": {"nope": 1}, "max": {}});
        assert!(serde_json::from_value::<StatisticsSnapshot>(json).is_err());
    }

    #[test]
    fn merged_takes_maxima() {
        let mut a = StatisticsRecorder::new();
        a.record_create(Metric::CommandPoolRequestCount, 2);
        a.raise_max(Metric::MaxTimestampQueriesPerPool, 8);
        let mut b = StatisticsRecorder::new();
        b.record_create(Metric::CommandPoolRequestCount, 5);
        b.raise_max(Metric::MaxTimestampQueriesPerPool, 3);
        let merged = a.snapshot().merged(&b.snapshot());
        assert_eq!(merged.current.get(Metric::CommandPoolRequestCount), 7);
        assert_eq!(merged.max.get(Metric::CommandPoolRequestCount), 7);
        assert_eq!(merged.max.get(Metric::MaxTimestampQueriesPerPool), 8);
    }

    #[test]
    fn merged_keeps_maximum_at_or_above_current() {
        let mut a = StatisticsRecorder::new();
        a.record_create(Metric::ImageViewRequestCount, 9);
        assert!(a.record_destroy(Metric::ImageViewRequestCount, 6));
        a.record_create(Metric::SamplerRequestCount, 2);
        let mut b = StatisticsRecorder::new();
        b.record_create(Metric::ImageViewRequestCount, 4);
        b.record_create(Metric::SamplerRequestCount, 5);

        let merged = a.snapshot().merged(&b.snapshot());
        // A peak seen by one device alone still wins over the summed live count.
        assert_eq!(merged.current.get(Metric::ImageViewRequestCount), 7);
        assert_eq!(merged.max.get(Metric::ImageViewRequestCount), 9);
        assert_eq!(merged.current.get(Metric::SamplerRequestCount), 7);
        assert_eq!(merged.max.get(Metric::SamplerRequestCount), 7);
        for merged in [merged, b.snapshot().merged(&a.snapshot())] {
            for metric in Metric::ALL.iter().copied() {
                assert!(
                    merged.max.get(metric) >= merged.current.get(metric),
                    "{metric}: max {} < current {}",
                    merged.max.get(metric),
                    merged.current.get(metric)
                );
            }
        }
    }
}
