//! Reporting harness for the Vulkan SC driver membrane.
//!
//! This crate provides:
//! - Limit checks: compare gathered statistics against declared reservation limits
//! - Reservations: derive the limits a replay pass must request from gathered maxima
//! - Structured logs: canonical JSONL records for ledger events and limit violations
//! - Artifact index: SHA-256 digests linking logs to the snapshots they describe

#![forbid(unsafe_code)]

pub mod limits;
pub mod structured_log;

pub use limits::{LimitViolation, LimitsError, ReservationLimits, check_limits, load_snapshots};
pub use structured_log::{ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome};
