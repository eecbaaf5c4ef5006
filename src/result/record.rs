//! Typed fields and the run record.

use std::collections::HashMap;
use std::fmt;

/// One field of a run record, typed at parse time.
///
/// Artifact values arrive as text or raw samples and are narrowed here
/// once, so downstream code matches on a type instead of re-parsing
/// strings.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
    /// Repeated text entries for one key, in order of appearance.
    TextList(Vec<String>),
    /// One waveform column. A column with a single sample is a [`Real`]
    /// scalar instead, never a one-element series.
    ///
    /// [`Real`]: FieldValue::Real
    Series(Vec<f64>),
}

impl FieldValue {
    /// Parse text into the narrowest scalar: integer, then real, then
    /// text.
    pub fn from_text(text: &str) -> Self {
        if let Ok(value) = text.parse::<i64>() {
            return FieldValue::Integer(value);
        }
        if let Ok(value) = text.parse::<f64>() {
            return FieldValue::Real(value);
        }
        FieldValue::Text(text.to_string())
    }

    /// Numeric view of a scalar value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(value) => Some(*value as f64),
            FieldValue::Real(value) => Some(*value),
            _ => None,
        }
    }

    /// The samples, when the value is a series.
    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            FieldValue::Series(samples) => Some(samples),
            _ => None,
        }
    }
}

/// Human-oriented rendering for summaries and diagnostics. Scalars print
/// verbatim, text lists join with `;`, a series prints as its length.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(value) => write!(f, "{}", value),
            FieldValue::Real(value) => write!(f, "{}", value),
            FieldValue::Text(value) => write!(f, "{}", value),
            FieldValue::TextList(values) => write!(f, "{}", values.join("; ")),
            FieldValue::Series(samples) => write!(f, "[{} samples]", samples.len()),
        }
    }
}

/// How a simulator invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Exit code zero, artifacts parsed.
    Completed,
    /// Non-zero exit or failure to launch.
    Failed,
    /// Deadline passed, process killed.
    TimedOut,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Everything one simulator run produced.
///
/// Failed and timed-out runs carry an empty field map and surface the
/// simulator's log lines as `diagnostics` instead, so a sweep can record
/// the failure and move on.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub status: RunStatus,
    /// Merged fields from the waveform artifact, the echoed netlist, and
    /// the log.
    pub fields: HashMap<String, FieldValue>,
    /// Wall-clock seconds for the whole run including file I/O. `None`
    /// for cache hits and failures, and deliberately kept out of
    /// `fields` so two runs of the same document compare equal on them.
    pub total_seconds: Option<f64>,
    pub diagnostics: Vec<String>,
}

impl RunResult {
    /// A successful run with the given merged fields.
    pub fn completed(fields: HashMap<String, FieldValue>) -> Self {
        RunResult {
            status: RunStatus::Completed,
            fields,
            total_seconds: None,
            diagnostics: Vec::new(),
        }
    }

    /// A contained failure (non-zero exit or spawn error).
    pub fn failed(diagnostics: Vec<String>) -> Self {
        RunResult {
            status: RunStatus::Failed,
            fields: HashMap::new(),
            total_seconds: None,
            diagnostics,
        }
    }

    /// A run killed at its deadline.
    pub fn timed_out(diagnostics: Vec<String>) -> Self {
        RunResult {
            status: RunStatus::TimedOut,
            fields: HashMap::new(),
            total_seconds: None,
            diagnostics,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
