//! Driver membrane state for the Vulkan SC conformance driver wrappers.
//!
//! Everything the safety-critical device wrapper mutates while intercepting
//! create and destroy calls lives here, independent of how entry points are
//! loaded.
//!
//! # Architecture
//!
//! - **Configuration** (`config`): process mode (gathering or replaying) and tunables
//! - **Statistics** (`statistics`): current and maximum-observed counters per metric
//! - **Shadow registry** (`registry`): replayable creation records and object hashes
//! - **Event log** (`events`): bounded record of ledger mutations
//! - **Ledger** (`ledger`): the three stores above behind one per-device lock
//! - **Resources** (`resources`): the budgeting and sequencing collaborator

#![deny(unsafe_code)]

pub mod config;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod resources;
pub mod statistics;

pub use config::{MembraneConfig, ProcessMode, init_process_mode, process_mode};
pub use events::{EventKind, EventLog, LedgerEvent};
pub use ledger::{DeviceLedger, LedgerState};
pub use registry::{CommandBufferRecord, ObjectRecord, ShadowKind, ShadowRegistry, ShadowStore};
pub use resources::{
    CommandBufferUsage, CommandPoolMemoryConsumption, ResourceInterface, StandardResources,
};
pub use statistics::{Metric, MetricTable, StatisticsRecorder, StatisticsSnapshot};
