//! Per-device ledger: statistics, shadow registry and event log behind one lock.
//!
//! One logical intercepted call holds the guard for its whole duration, so
//! cooperating metrics (a render pass and its subpass/attachment counts) are
//! always observed together.

use parking_lot::{Mutex, MutexGuard};
use vksc_core::handle::ObjectKind;

use crate::config::{DEFAULT_EVENT_LOG_CAPACITY, ProcessMode};
use crate::events::{EventKind, EventLog, LedgerEvent};
use crate::registry::ShadowRegistry;
use crate::statistics::{StatisticsRecorder, StatisticsSnapshot};

/// Everything mutated by an intercepted call.
#[derive(Debug)]
pub struct LedgerState {
    mode: ProcessMode,
    pub stats: StatisticsRecorder,
    pub shadows: ShadowRegistry,
    pub events: EventLog,
}

impl LedgerState {
    #[must_use]
    pub const fn mode(&self) -> ProcessMode {
        self.mode
    }

    /// Append an event stamped with this ledger's process mode.
    pub fn note(&mut self, kind: EventKind, object: ObjectKind, handle: u64) -> u64 {
        self.events.push(kind, object, handle, self.mode)
    }

    /// Clear the shadow registry. Statistics and the handle counter are kept.
    pub fn reset(&mut self) {
        self.shadows.reset();
        self.note(EventKind::Reset, ObjectKind::Device, 0);
    }
}

/// Thread-safe ledger owned by one device wrapper.
#[derive(Debug)]
pub struct DeviceLedger {
    state: Mutex<LedgerState>,
}

impl DeviceLedger {
    #[must_use]
    pub fn new(mode: ProcessMode) -> Self {
        Self::with_event_capacity(mode, DEFAULT_EVENT_LOG_CAPACITY)
    }

    #[must_use]
    pub fn with_event_capacity(mode: ProcessMode, capacity: usize) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                mode,
                stats: StatisticsRecorder::new(),
                shadows: ShadowRegistry::new(),
                events: EventLog::with_capacity(capacity),
            }),
        }
    }

    /// Acquire the coarse lock for one logical call.
    pub fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock()
    }

    #[must_use]
    pub fn mode(&self) -> ProcessMode {
        self.state.lock().mode
    }

    #[must_use]
    pub fn snapshot(&self) -> StatisticsSnapshot {
        self.state.lock().stats.snapshot()
    }

    /// Copy of the retained events.
    #[must_use]
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.state.lock().events.iter().copied().collect()
    }

    pub fn reset(&self) {
        self.state.lock().reset();
    }
}
