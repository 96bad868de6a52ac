//! Pending-work tracking for the scheduler.
//!
//! The [`WorkQueue`] holds at most one [`WorkItem`] per unit; rapid edits to
//! the same unit coalesce into it, so a burst of keystrokes costs a single
//! analysis pass. Draining is atomic with selection: an entry is never
//! handed to two cycles.
//!
//! Every pending generation carries a [`CompletionSignal`] that query
//! callers can wait on with a bound. The latest signal per unit survives
//! draining, because a unit that is mid-analysis is still "not settled"
//! from a caller's perspective.


use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio::time::Instant;

use crate::AnalysisUnit;
use crate::UnitId;

/// Single-use completion token for one analysis generation.
///
/// Released exactly once per generation, independent of whether the
/// producing analysis succeeded, failed or was cancelled. Later calls to
/// [`release`](Self::release) are no-ops.
#[derive(Debug)]
pub struct CompletionSignal {
    released: AtomicBool,
    tx: watch::Sender<bool>,
}

impl CompletionSignal {
    pub(crate) fn new() -> Arc<Self> {
        let (tx, _rx) = watch::channel(false);
        Arc::new(CompletionSignal {
            released: AtomicBool::new(false),
            tx,
        })
    }

    /// Fires the signal. Only the first call has an effect.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.tx.send_replace(true);
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Waits up to `bound` for the signal to fire.
    ///
    /// Returns `false` on timeout. Callers treat a timeout as "still in
    /// flight", not as a failure.
    pub async fn wait_released(
        &self,
        bound: Duration,
    ) -> bool {
        let mut rx = self.tx.subscribe();
        // Bind before returning: the wait result borrows `rx` and must be
        // dropped first.
        let released = timeout(bound, rx.wait_for(|released| *released)).await.is_ok();
        released
    }
}

/// One pending analysis generation for a unit.
///
/// Exists only while queued; the snapshot is the one the eventual analysis
/// runs against, replaced wholesale when a newer edit coalesces in.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub unit: AnalysisUnit,
    pub enqueued_at: Instant,
    pub signal: Arc<CompletionSignal>,
}

struct QueueState {
    /// At most one entry per unit; superseded entries are replaced wholesale.
    pending: HashMap<UnitId, WorkItem>,
    /// Latest generation signal per unit, kept past draining so queries can
    /// wait on in-flight analyses.
    live_signals: HashMap<UnitId, Arc<CompletionSignal>>,
}

/// Shared, coalescing work queue keyed by unit id.
///
/// Upsert and drain-and-remove are mutually atomic under one mutex; both
/// critical sections are short and never held across an await point.
pub struct WorkQueue {
    state: Mutex<QueueState>,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    pub fn new() -> Self {
        WorkQueue {
            state: Mutex::new(QueueState {
                pending: HashMap::new(),
                live_signals: HashMap::new(),
            }),
        }
    }

    /// Inserts or replaces the pending entry for `unit.id` with a fresh
    /// timestamp and the given snapshot.
    ///
    /// If a pending entry already exists and its signal has not fired, the
    /// edit coalesces into the same generation and the signal is reused.
    /// Otherwise a fresh generation signal is minted — in particular, an
    /// edit arriving while the previous generation is mid-analysis starts a
    /// new generation rather than touching the in-flight one.
    pub fn enqueue(
        &self,
        unit: AnalysisUnit,
    ) -> Arc<CompletionSignal> {
        let mut state = self.state.lock();

        let reusable = state
            .pending
            .get(&unit.id)
            .filter(|existing| !existing.signal.is_released())
            .map(|existing| existing.signal.clone());

        let signal = match reusable {
            Some(signal) => signal,
            None => {
                let fresh = CompletionSignal::new();
                state.live_signals.insert(unit.id.clone(), fresh.clone());
                fresh
            }
        };

        let id = unit.id.clone();
        state.pending.insert(
            id,
            WorkItem {
                unit,
                enqueued_at: Instant::now(),
                signal: signal.clone(),
            },
        );
        signal
    }

    /// Atomically selects, removes and returns the ready batch.
    ///
    /// Ready means the entry has been quiet for at least `debounce_window`.
    /// Most recently edited units come first so the unit under active edit
    /// gets the freshest feedback soonest; at most `max_batch` entries are
    /// taken and everything still inside the debounce window stays queued.
    pub fn drain_ready(
        &self,
        max_batch: usize,
        debounce_window: Duration,
    ) -> Vec<WorkItem> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let mut ready: Vec<(Instant, UnitId)> = state
            .pending
            .iter()
            .filter(|(_, item)| now.duration_since(item.enqueued_at) >= debounce_window)
            .map(|(id, item)| (item.enqueued_at, id.clone()))
            .collect();

        // Most recently edited first
        ready.sort_by(|a, b| b.0.cmp(&a.0));
        ready.truncate(max_batch);

        ready
            .into_iter()
            .filter_map(|(_, id)| state.pending.remove(&id))
            .collect()
    }

    /// Latest generation signal for the unit, whether queued or in flight.
    pub fn live_signal(
        &self,
        id: &UnitId,
    ) -> Option<Arc<CompletionSignal>> {
        self.state.lock().live_signals.get(id).cloned()
    }

    /// Number of entries still pending (queued, not yet drained).
    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().pending.is_empty()
    }
}
