//! Bounded ledger event log.
//!
//! Every intercepted call that touches the ledger appends one event. The log
//! lives inside the per-device ledger lock, so sequence numbers are dense and
//! ordered exactly as the mutations were applied. When full, the oldest event
//! is evicted.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use vksc_core::handle::ObjectKind;

use crate::config::ProcessMode;

/// What happened to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A tracked object was created (synthetic or forwarded).
    Create,
    /// A tracked object was destroyed and its record removed.
    Destroy,
    /// A destroy named a handle the registry does not track.
    DestroyMiss,
    /// The call went straight to the real driver.
    Forward,
    /// The shadow registry was cleared.
    Reset,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Destroy => "destroy",
            Self::DestroyMiss => "destroy_miss",
            Self::Forward => "forward",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub seq: u64,
    pub kind: EventKind,
    pub object: ObjectKind,
    pub handle: u64,
    pub mode: ProcessMode,
}

/// Ring buffer of [`LedgerEvent`]s.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<LedgerEvent>,
    capacity: usize,
    next_seq: u64,
    evicted: u64,
}

impl EventLog {
    /// A log holding at most `capacity` events. A zero capacity keeps
    /// sequence numbering but stores nothing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            next_seq: 0,
            evicted: 0,
        }
    }

    /// Append an event and return its sequence number.
    pub fn push(&mut self, kind: EventKind, object: ObjectKind, handle: u64, mode: ProcessMode) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.capacity == 0 {
            self.evicted += 1;
            return seq;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.evicted += 1;
        }
        self.events.push_back(LedgerEvent {
            seq,
            kind,
            object,
            handle,
            mode,
        });
        seq
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.events.iter()
    }

    /// Events with `seq >= from`, oldest first.
    #[must_use]
    pub fn since(&self, from: u64) -> Vec<LedgerEvent> {
        self.events.iter().filter(|e| e.seq >= from).copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sequence number the next event will get.
    #[must_use]
    pub const fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Events dropped to stay within capacity.
    #[must_use]
    pub const fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Remove and return every retained event. Sequence numbering continues.
    pub fn drain(&mut self) -> Vec<LedgerEvent> {
        self.events.drain(..).collect()
    }
}
