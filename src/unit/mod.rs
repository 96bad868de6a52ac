//! Core value types shared across the scheduler.
//!
//! Units and snapshots are owned by the external source model; the
//! scheduler copies them at enqueue time and never mutates them afterwards.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

/// Stable identifier of one analysis unit (e.g. a project).
///
/// Cheap to clone; used as the key of the work queue and the result store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(Arc<str>);

impl UnitId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        UnitId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        UnitId(Arc::from(id))
    }
}

/// Identifier of one diagnostic provider (analyzer).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalyzerId(Arc<str>);

impl AnalyzerId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        AnalyzerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnalyzerId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnalyzerId {
    fn from(id: &str) -> Self {
        AnalyzerId(Arc::from(id))
    }
}

/// The copied source state one analysis pass runs against.
///
/// Versions are assigned by the external source model and are monotonic per
/// unit; the scheduler only compares them, never produces them.
#[derive(Debug, Clone)]
pub struct UnitSnapshot {
    pub version: u64,
    pub fingerprint: Arc<str>,
}

impl UnitSnapshot {
    pub fn new(
        version: u64,
        fingerprint: impl Into<Arc<str>>,
    ) -> Self {
        UnitSnapshot {
            version,
            fingerprint: fingerprint.into(),
        }
    }
}

/// One independently analyzable source grouping.
///
/// `analyzers` are the providers attached specifically to this unit; they
/// are unioned with the globally registered providers at invocation time.
#[derive(Debug, Clone)]
pub struct AnalysisUnit {
    pub id: UnitId,
    pub name: String,
    pub snapshot: UnitSnapshot,
    pub analyzers: Vec<AnalyzerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hidden,
}

/// A single reported issue from one analysis pass.
///
/// `unit_name` is stamped by the scheduler when the producing result entry
/// is published, so consumers can attribute flattened diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub message: String,
    pub id: String,
    pub severity: Severity,
    pub unit_name: String,
}
