//! Reservation limits and limit checks over gathered statistics.
//!
//! Limits are a flat JSON object mapping reservation field names (the
//! camelCase metric names) to upper bounds. A metric without a declared limit
//! is not checked.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vksc_membrane::{Metric, StatisticsSnapshot};

#[derive(Debug, Error)]
pub enum LimitsError {
    #[error("failed reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown metric '{0}'")]
    UnknownMetric(String),
    #[error("no statistics snapshots given")]
    NoSnapshots,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, LimitsError> {
    let content = std::fs::read_to_string(path).map_err(|source| LimitsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LimitsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Declared upper bounds, keyed by reservation field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationLimits {
    limits: BTreeMap<String, u64>,
}

impl ReservationLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The reservation a replay pass must request to fit everything the
    /// gathering pass observed: every metric's maximum.
    #[must_use]
    pub fn from_snapshot(snapshot: &StatisticsSnapshot) -> Self {
        let limits = Metric::ALL
            .iter()
            .map(|m| (m.name().to_owned(), snapshot.max.get(*m)))
            .collect();
        Self { limits }
    }

    pub fn from_file(path: &Path) -> Result<Self, LimitsError> {
        read_json(path)
    }

    pub fn set(&mut self, metric: Metric, limit: u64) -> &mut Self {
        self.limits.insert(metric.name().to_owned(), limit);
        self
    }

    #[must_use]
    pub fn get(&self, metric: Metric) -> Option<u64> {
        self.limits.get(metric.name()).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.limits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Declared limits resolved to metrics. Fails on the first unknown name.
    pub fn resolved(&self) -> Result<Vec<(Metric, u64)>, LimitsError> {
        self.limits
            .iter()
            .map(|(name, limit)| {
                Metric::from_name(name)
                    .map(|m| (m, *limit))
                    .ok_or_else(|| LimitsError::UnknownMetric(name.clone()))
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One metric whose observed maximum exceeds its declared limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitViolation {
    pub metric: Metric,
    pub observed: u64,
    pub limit: u64,
}

impl LimitViolation {
    /// JSON form used in reports and log details.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "metric": self.metric.name(),
            "observed": self.observed,
            "limit": self.limit,
        })
    }
}

/// Compare the maximum table of `snapshot` against every declared limit.
///
/// Violations come back in metric-name order.
pub fn check_limits(
    snapshot: &StatisticsSnapshot,
    limits: &ReservationLimits,
) -> Result<Vec<LimitViolation>, LimitsError> {
    Ok(limits
        .resolved()?
        .into_iter()
        .filter_map(|(metric, limit)| {
            let observed = snapshot.max.get(metric);
            (observed > limit).then_some(LimitViolation {
                metric,
                observed,
                limit,
            })
        })
        .collect())
}

/// Load one or more snapshot files and merge them into one.
pub fn load_snapshots<P: AsRef<Path>>(paths: &[P]) -> Result<StatisticsSnapshot, LimitsError> {
    let mut merged: Option<StatisticsSnapshot> = None;
    for path in paths {
        let snapshot: StatisticsSnapshot = read_json(path.as_ref())?;
        merged = Some(match merged {
            Some(acc) => acc.merged(&snapshot),
            None => snapshot,
        });
    }
    merged.ok_or(LimitsError::NoSnapshots)
}
