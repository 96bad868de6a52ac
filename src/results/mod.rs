//! Latest-diagnostics store.
//!
//! One entry per unit, replaced wholesale when a newer analysis completes
//! and never merged. Writes are per-key and need no cross-key locking, so
//! the store is a plain [`DashMap`]. Size is bounded by the live unit
//! count; entries are only ever superseded, never deleted.

#[cfg(test)]
mod results_test;

use std::time::SystemTime;

use dashmap::DashMap;

use crate::Diagnostic;
use crate::UnitId;

/// The latest published analysis outcome for one unit.
#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub unit_id: UnitId,
    pub unit_name: String,
    /// Ordered as produced by the analysis pass.
    pub diagnostics: Vec<Diagnostic>,
    pub produced_at: SystemTime,
    /// Snapshot version the producing analysis started from. Never older
    /// than the snapshot that was active at analysis start.
    pub snapshot_version: u64,
}

#[derive(Default)]
pub struct ResultStore {
    entries: DashMap<UnitId, ResultEntry>,
}

impl ResultStore {
    pub fn new() -> Self {
        ResultStore {
            entries: DashMap::new(),
        }
    }

    /// Replaces the unit's entry wholesale.
    pub fn publish(
        &self,
        entry: ResultEntry,
    ) {
        self.entries.insert(entry.unit_id.clone(), entry);
    }

    pub fn get(
        &self,
        id: &UnitId,
    ) -> Option<ResultEntry> {
        self.entries.get(id).map(|entry| entry.clone())
    }

    /// Flattens the requested units' diagnostics, in requested-id order.
    ///
    /// Units without an entry contribute nothing; callers degrade to
    /// partial data rather than failing.
    pub fn collect(
        &self,
        ids: &[UnitId],
    ) -> Vec<Diagnostic> {
        ids.iter()
            .filter_map(|id| self.entries.get(id))
            .flat_map(|entry| entry.diagnostics.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
