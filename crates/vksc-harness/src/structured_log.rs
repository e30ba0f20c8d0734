//! Structured logging for gathering and replay runs.
//!
//! Provides:
//! - [`LogEntry`]: canonical JSONL log record with required + optional fields.
//! - [`ArtifactIndex`]: links logs to snapshots and reports with SHA-256 integrity.
//! - [`LogEmitter`]: writes JSONL lines to a file, a buffer or stdout.
//! - [`validate_log_line`]: validates a single JSONL line against the schema.
//! - [`validate_log_file`]: validates an entire JSONL file.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vksc_core::ObjectKind;
use vksc_membrane::{EventKind, LedgerEvent, ProcessMode};

use crate::limits::LimitViolation;

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Severity level for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Check outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
    Error,
}

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MODES: [&str; 2] = [ProcessMode::Gathering.as_str(), ProcessMode::Replaying.as_str()];
const OUTCOMES: [&str; 4] = ["pass", "fail", "skip", "error"];
const OBJECT_KINDS: [ObjectKind; 16] = [
    ObjectKind::Instance,
    ObjectKind::PhysicalDevice,
    ObjectKind::Device,
    ObjectKind::Image,
    ObjectKind::ImageView,
    ObjectKind::DescriptorSetLayout,
    ObjectKind::PipelineLayout,
    ObjectKind::PipelineCache,
    ObjectKind::Pipeline,
    ObjectKind::RenderPass,
    ObjectKind::Sampler,
    ObjectKind::SamplerYcbcrConversion,
    ObjectKind::ShaderModule,
    ObjectKind::QueryPool,
    ObjectKind::CommandPool,
    ObjectKind::CommandBuffer,
];

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    // Required
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    // Optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_kind: Option<ObjectKind>,
    /// Raw handle, rendered `0x`-prefixed hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Ledger sequence number of the event this entry renders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_seq: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_refs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            mode: None,
            object_kind: None,
            handle: None,
            ledger_seq: None,
            metric: None,
            outcome: None,
            artifact_refs: None,
            details: None,
        }
    }

    /// Render one ledger event. Destroys of untracked handles log at `warn`.
    #[must_use]
    pub fn from_event(trace_id: impl Into<String>, event: &LedgerEvent) -> Self {
        let level = match event.kind {
            EventKind::DestroyMiss => LogLevel::Warn,
            _ => LogLevel::Info,
        };
        let mut entry = Self::new(trace_id, level, event.kind.as_str())
            .with_mode(event.mode)
            .with_object(event.object, event.handle);
        entry.ledger_seq = Some(event.seq);
        entry
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ProcessMode) -> Self {
        self.mode = Some(mode.as_str().to_owned());
        self
    }

    #[must_use]
    pub fn with_object(mut self, kind: ObjectKind, handle: u64) -> Self {
        self.object_kind = Some(kind);
        self.handle = Some(format!("{handle:#x}"));
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_artifacts(mut self, refs: Vec<String>) -> Self {
        self.artifact_refs = Some(refs);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Artifact index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub path: String,
    pub kind: String,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Artifact index linking logs to the snapshots and reports of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactIndex {
    pub index_version: u32,
    pub run_id: String,
    pub generated_utc: String,
    pub artifacts: Vec<ArtifactEntry>,
}

impl ArtifactIndex {
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            index_version: 1,
            run_id: run_id.into(),
            generated_utc: now_utc(),
            artifacts: Vec::new(),
        }
    }

    /// Add an entry for in-memory content.
    pub fn add_bytes(&mut self, path: impl Into<String>, kind: impl Into<String>, data: &[u8]) -> &mut Self {
        self.artifacts.push(ArtifactEntry {
            path: path.into(),
            kind: kind.into(),
            sha256: sha256_hex(data),
            size_bytes: Some(data.len() as u64),
        });
        self
    }

    /// Read `path` and add its digest.
    pub fn add_file(&mut self, path: &Path, kind: impl Into<String>) -> std::io::Result<&mut Self> {
        let data = std::fs::read(path)?;
        Ok(self.add_bytes(path.display().to_string(), kind, &data))
    }

    /// Entries whose file content no longer matches the recorded digest.
    /// Unreadable files count as mismatches.
    #[must_use]
    pub fn stale_entries(&self, root: &Path) -> Vec<&ArtifactEntry> {
        self.artifacts
            .iter()
            .filter(|entry| {
                std::fs::read(root.join(&entry.path))
                    .map(|data| sha256_hex(&data) != entry.sha256)
                    .unwrap_or(true)
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Log emitter
// ---------------------------------------------------------------------------

/// Writes structured JSONL log entries.
///
/// Trace ids follow `<run_id>::<device>::<seq>`, with `seq` counting the
/// entries this emitter has written.
pub struct LogEmitter<W: Write> {
    writer: W,
    seq: u64,
    run_id: String,
    device: String,
}

impl LogEmitter<std::io::BufWriter<std::fs::File>> {
    pub fn to_file(path: &Path, run_id: &str, device: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(std::io::BufWriter::new(file), run_id, device))
    }
}

impl LogEmitter<Vec<u8>> {
    #[must_use]
    pub fn to_buffer(run_id: &str, device: &str) -> Self {
        Self::new(Vec::new(), run_id, device)
    }
}

impl LogEmitter<std::io::Stdout> {
    #[must_use]
    pub fn to_stdout(run_id: &str, device: &str) -> Self {
        Self::new(std::io::stdout(), run_id, device)
    }
}

impl<W: Write> LogEmitter<W> {
    pub fn new(writer: W, run_id: &str, device: &str) -> Self {
        Self {
            writer,
            seq: 0,
            run_id: run_id.to_owned(),
            device: device.to_owned(),
        }
    }

    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.run_id, self.device, self.seq)
    }

    fn write_entry(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    /// Emit a bare entry with an auto-generated trace id.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let entry = LogEntry::new(self.next_trace_id(), level, event);
        self.write_entry(&entry)?;
        Ok(entry)
    }

    /// Emit a fully-populated entry, filling in the trace id when empty.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        self.write_entry(&entry)
    }

    /// Emit one entry per ledger event, in order.
    pub fn emit_events<'a, I>(&mut self, events: I) -> std::io::Result<usize>
    where
        I: IntoIterator<Item = &'a LedgerEvent>,
    {
        let mut written = 0;
        for event in events {
            let entry = LogEntry::from_event(self.next_trace_id(), event);
            self.write_entry(&entry)?;
            written += 1;
        }
        Ok(written)
    }

    /// Emit one `limit_check` entry per violation, or a single passing entry.
    pub fn emit_limit_check(&mut self, violations: &[LimitViolation]) -> std::io::Result<()> {
        if violations.is_empty() {
            let entry = LogEntry::new(self.next_trace_id(), LogLevel::Info, "limit_check")
                .with_outcome(Outcome::Pass);
            return self.write_entry(&entry);
        }
        for violation in violations {
            let entry = LogEntry::new(self.next_trace_id(), LogLevel::Error, "limit_check")
                .with_metric(violation.metric.name())
                .with_outcome(Outcome::Fail)
                .with_details(violation.to_value());
            self.write_entry(&entry)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    /// Recover the writer, e.g. the buffer of a test emitter.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: field '{}': {}",
            self.line_number, self.field, self.message
        )
    }
}

fn check_enum(
    obj: &serde_json::Map<String, serde_json::Value>,
    field: &str,
    allowed: &[&str],
    line_number: usize,
    errors: &mut Vec<LogValidationError>,
) {
    if let Some(value) = obj.get(field).and_then(|v| v.as_str())
        && !allowed.contains(&value)
    {
        errors.push(LogValidationError {
            line_number,
            field: field.to_owned(),
            message: format!("invalid {field}: '{value}'"),
        });
    }
}

/// Validate a single JSONL line against the schema.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let error = |field: &str, message: String| LogValidationError {
        line_number,
        field: field.to_owned(),
        message,
    };

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return Err(vec![error("<json>", format!("invalid JSON: {e}"))]),
    };
    let Some(obj) = value.as_object() else {
        return Err(vec![error("<root>", "expected JSON object".to_owned())]);
    };

    let mut errors = Vec::new();
    for field in ["timestamp", "trace_id", "level", "event"] {
        if !obj.contains_key(field) {
            errors.push(error(field, "required field missing".to_owned()));
        }
    }

    let kinds: Vec<&str> = OBJECT_KINDS.iter().map(|k| k.as_str()).collect();
    check_enum(obj, "level", &LEVELS, line_number, &mut errors);
    check_enum(obj, "mode", &MODES, line_number, &mut errors);
    check_enum(obj, "outcome", &OUTCOMES, line_number, &mut errors);
    check_enum(obj, "object_kind", &kinds, line_number, &mut errors);

    if let Some(trace_id) = obj.get("trace_id").and_then(|v| v.as_str())
        && trace_id.split("::").count() != 3
    {
        errors.push(error(
            "trace_id",
            format!("trace_id should follow <run_id>::<device>::<seq> format, got: '{trace_id}'"),
        ));
    }

    if obj.contains_key("handle") && !obj.contains_key("object_kind") {
        errors.push(error(
            "object_kind",
            "entries carrying a handle must name its object_kind".to_owned(),
        ));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value::<LogEntry>(value)
        .map_err(|e| vec![error("<deserialization>", format!("failed to deserialize: {e}"))])
}

/// Validate an entire JSONL file.
///
/// Returns the non-empty line count and any validation errors found.
pub fn validate_log_file(path: &Path) -> Result<(usize, Vec<LogValidationError>), std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut all_errors = Vec::new();
    let mut line_count = 0;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if let Err(errs) = validate_log_line(line, i + 1) {
            all_errors.extend(errs);
        }
    }

    Ok((line_count, all_errors))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let (year, month, day) = civil_from_days(secs / 86_400);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
        duration.subsec_millis(),
    )
}

/// Gregorian date of a day count since 1970-01-01.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}
