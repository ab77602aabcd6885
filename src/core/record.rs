// appstrap - core/record.rs
//
// Core data model types: the structured log record the filtering handler
// evaluates, its severity scale, and the explicit enumeration of
// pattern-matchable fields. Pure data definitions with no I/O.

use chrono::{DateTime, Utc};
use std::borrow::Cow;

// =============================================================================
// Severity
// =============================================================================

/// Normalised severity levels, ordered from most to least severe.
///
/// The numeric scale (50 down to 5) is the classic handler-threshold scale:
/// a threshold of N admits records whose number is >= N, and 1 admits
/// everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

impl Severity {
    /// Returns all variants in order (most severe first).
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Critical,
            Severity::Error,
            Severity::Warning,
            Severity::Info,
            Severity::Debug,
            Severity::Trace,
        ]
    }

    /// Numeric level of this severity.
    pub fn number(&self) -> u32 {
        match self {
            Severity::Critical => 50,
            Severity::Error => 40,
            Severity::Warning => 30,
            Severity::Info => 20,
            Severity::Debug => 10,
            Severity::Trace => 5,
        }
    }

    /// Upper-case level name as it appears in records and formats.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
            Severity::Trace => "TRACE",
        }
    }

    /// Parses a severity from its name, case-insensitively.
    /// Accepts the common `warn` shorthand for `warning`.
    pub fn from_name(name: &str) -> Option<Severity> {
        match name.to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "error" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            "info" => Some(Severity::Info),
            "debug" => Some(Severity::Debug),
            "trace" => Some(Severity::Trace),
            _ => None,
        }
    }

    /// Maps a `tracing` level onto this scale. `tracing` has no critical
    /// level, so the mapping covers five of the six variants.
    pub fn from_tracing(level: &tracing::Level) -> Severity {
        match *level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::TRACE => Severity::Trace,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Record
// =============================================================================

/// A single structured log event with fixed named fields.
///
/// Records are immutable once built: the handler only reads fields off
/// them, and rule evaluation never mutates shared state.
#[derive(Debug, Clone)]
pub struct Record {
    /// Logger name (the event's target).
    pub name: String,

    /// Name of the thread that produced the record.
    pub thread: String,

    /// Source file basename.
    pub file_name: String,

    /// Name of the enclosing function-like scope (span), empty at top level.
    pub func_name: String,

    /// Severity; yields both the level name and the level number.
    pub severity: Severity,

    /// Source line number.
    pub line: u32,

    /// Rendered message text.
    pub message: String,

    /// Module path of the event's origin.
    pub module: String,

    /// Full source file path.
    pub path: String,

    /// Name of the producing process (executable).
    pub process: String,

    /// Absolute creation time.
    pub created: DateTime<Utc>,

    /// Milliseconds elapsed between program start and creation.
    pub relative_created_ms: f64,
}

impl Record {
    /// Absolute creation time as fractional seconds since the Unix epoch,
    /// the form interval rules are checked against.
    pub fn created_epoch(&self) -> f64 {
        self.created.timestamp() as f64 + f64::from(self.created.timestamp_subsec_micros()) / 1e6
    }

    /// String form of a pattern-matchable field. Numeric fields are
    /// coerced so literal and pattern rules see one representation.
    pub fn field(&self, field: FilterField) -> Cow<'_, str> {
        match field {
            FilterField::Thread => Cow::Borrowed(self.thread.as_str()),
            FilterField::Name => Cow::Borrowed(self.name.as_str()),
            FilterField::FileName => Cow::Borrowed(self.file_name.as_str()),
            FilterField::FuncName => Cow::Borrowed(self.func_name.as_str()),
            FilterField::LevelName => Cow::Borrowed(self.severity.label()),
            FilterField::LevelNo => Cow::Owned(self.severity.number().to_string()),
            FilterField::Line => Cow::Owned(self.line.to_string()),
            FilterField::Message => Cow::Borrowed(self.message.as_str()),
            FilterField::Module => Cow::Borrowed(self.module.as_str()),
            FilterField::Path => Cow::Borrowed(self.path.as_str()),
            FilterField::Process => Cow::Borrowed(self.process.as_str()),
        }
    }
}

// =============================================================================
// FilterField
// =============================================================================

/// The pattern-matchable record fields, in rule evaluation order.
///
/// Each stage of the handler walks this enumeration front to back, so the
/// order here is load-bearing: an exclude rule on `Thread` is decided
/// before one on `Name`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Thread,
    Name,
    FileName,
    FuncName,
    LevelName,
    LevelNo,
    Line,
    Message,
    Module,
    Path,
    Process,
}

impl FilterField {
    /// All fields in evaluation order.
    pub const ALL: [FilterField; 11] = [
        FilterField::Thread,
        FilterField::Name,
        FilterField::FileName,
        FilterField::FuncName,
        FilterField::LevelName,
        FilterField::LevelNo,
        FilterField::Line,
        FilterField::Message,
        FilterField::Module,
        FilterField::Path,
        FilterField::Process,
    ];

    /// Dense index for slot storage.
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Configuration key for this field (as used in overrides files).
    pub fn key(&self) -> &'static str {
        match self {
            FilterField::Thread => "thread",
            FilterField::Name => "name",
            FilterField::FileName => "file_name",
            FilterField::FuncName => "func_name",
            FilterField::LevelName => "level_name",
            FilterField::LevelNo => "level_no",
            FilterField::Line => "line",
            FilterField::Message => "message",
            FilterField::Module => "module",
            FilterField::Path => "path",
            FilterField::Process => "process",
        }
    }
}
