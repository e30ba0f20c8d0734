//! Process mode and membrane configuration.
//!
//! The process mode is fixed once per process. It comes either from the
//! command-line collaborator (`ProcessMode::from_subprocess_flag`) or from the
//! `VKSC_PROCESS_MODE` environment variable:
//! - `gather` (default): the supervising process. Tracked creates receive
//!   synthetic handles and update statistics; no real objects of the purely
//!   synthetic kinds are created.
//! - `replay`: a per-test subprocess. Every call reaches the real driver and
//!   statistics are left untouched.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Which pass this process performs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessMode {
    /// Statistics-gathering controller pass.
    #[default]
    Gathering,
    /// Per-test replay pass against the real driver.
    Replaying,
}

impl ProcessMode {
    /// Parse from string (case-insensitive). Unknown values fall back to gathering.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "replay" | "replaying" | "subprocess" | "sub" | "normal" => Self::Replaying,
            _ => Self::Gathering,
        }
    }

    /// Mode selected by the command-line collaborator's subprocess flag.
    #[must_use]
    pub const fn from_subprocess_flag(is_subprocess: bool) -> Self {
        if is_subprocess {
            Self::Replaying
        } else {
            Self::Gathering
        }
    }

    #[must_use]
    pub const fn is_gathering(self) -> bool {
        matches!(self, Self::Gathering)
    }

    #[must_use]
    pub const fn is_replaying(self) -> bool {
        matches!(self, Self::Replaying)
    }

    /// Stable lowercase name used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gathering => "gathering",
            Self::Replaying => "replaying",
        }
    }
}

static GLOBAL_MODE: OnceLock<ProcessMode> = OnceLock::new();

/// Process mode for this process (reads the environment on first call, cached thereafter).
#[must_use]
pub fn process_mode() -> ProcessMode {
    *GLOBAL_MODE.get_or_init(|| {
        std::env::var("VKSC_PROCESS_MODE")
            .map(|v| ProcessMode::from_str_loose(&v))
            .unwrap_or_default()
    })
}

/// Pin the process mode before anything reads it.
///
/// Returns the mode in effect: `mode` if this call won, otherwise the mode
/// fixed earlier. The mode never changes once set.
pub fn init_process_mode(mode: ProcessMode) -> ProcessMode {
    *GLOBAL_MODE.get_or_init(|| mode)
}

/// Default capacity of the per-device ledger event log.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 4096;

/// Fallback command-pool reservation when no estimate is queued.
pub const DEFAULT_COMMAND_POOL_RESERVED_SIZE: u64 = 64 * 1024;

/// Fallback command-buffer count per pool when no estimate is queued.
pub const DEFAULT_COMMAND_POOL_MAX_BUFFERS: u32 = 16;

/// Membrane configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembraneConfig {
    pub process_mode: ProcessMode,
    pub event_log_capacity: usize,
    pub command_pool_reserved_size: u64,
    pub command_pool_max_buffers: u32,
}

impl MembraneConfig {
    /// Configuration with defaults for everything except the mode.
    #[must_use]
    pub const fn with_mode(process_mode: ProcessMode) -> Self {
        Self {
            process_mode,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            command_pool_reserved_size: DEFAULT_COMMAND_POOL_RESERVED_SIZE,
            command_pool_max_buffers: DEFAULT_COMMAND_POOL_MAX_BUFFERS,
        }
    }

    /// Build from the environment. Unparseable numeric values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::with_mode(process_mode());
        if let Some(v) = env_number("VKSC_EVENT_LOG_CAPACITY") {
            config.event_log_capacity = v as usize;
        }
        if let Some(v) = env_number("VKSC_COMMAND_POOL_RESERVED_SIZE") {
            config.command_pool_reserved_size = v;
        }
        if let Some(v) = env_number("VKSC_COMMAND_POOL_MAX_BUFFERS") {
            config.command_pool_max_buffers = u32::try_from(v).unwrap_or(u32::MAX);
        }
        config
    }
}

impl Default for MembraneConfig {
    fn default() -> Self {
        Self::with_mode(ProcessMode::default())
    }
}

fn env_number(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.trim().parse().ok()
}
