//! The scheduler core: one explicit object owning the work queue, the
//! result store and the background analysis loop.
//!
//! ## Key Responsibilities
//! - Receives change notifications and coalesces them into pending work
//! - Drains a debounced, prioritized, size-capped batch each cycle and runs
//!   one analysis task per drained unit
//! - Publishes whole-entry results and releases per-generation completion
//!   signals so bounded query waits never starve
//! - Answers [`request_diagnostics`](Scheduler::request_diagnostics) with
//!   best-available data within the caller's bound
//!
//! ## Example Usage
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use diag_engine::{SchedulerBuilder, SchedulerConfig, Analyzer};
//! # async fn example(analyzer: Arc<dyn Analyzer>) -> diag_engine::Result<()> {
//! let scheduler = SchedulerBuilder::new(SchedulerConfig::default())
//!     .analyzer(analyzer)
//!     .build()?;
//! // feed change notifications, query diagnostics ...
//! scheduler.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Notes
//! - **Thread Safety**: all state is owned by the `Scheduler`; no ambient or
//!   static state. External callers interact only through its methods.
//! - **Resource Cleanup**: shutdown is cooperative via `CancellationToken`;
//!   in-flight analyses observe a child token.


use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::Mutex;
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio::time::timeout_at;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::AnalysisUnit;
use crate::Analyzer;
use crate::AnalyzerId;
use crate::Diagnostic;
use crate::Error;
use crate::NoOverrides;
use crate::Result;
use crate::ResultEntry;
use crate::ResultStore;
use crate::RulesetOverrides;
use crate::SchedulerConfig;
use crate::SchedulerError;
use crate::UnitId;
use crate::UnitSnapshot;
use crate::WorkItem;
use crate::WorkQueue;

/// Builder for a [`Scheduler`].
///
/// The analyzer capability is mandatory; the ruleset override service
/// defaults to a pass-through. `build()` validates the configuration and
/// spawns the background loop.
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    analyzer: Option<Arc<dyn Analyzer>>,
    overrides: Option<Arc<dyn RulesetOverrides>>,
}

impl SchedulerBuilder {
    pub fn new(config: SchedulerConfig) -> Self {
        SchedulerBuilder {
            config,
            analyzer: None,
            overrides: None,
        }
    }

    pub fn analyzer(
        mut self,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn overrides(
        mut self,
        overrides: Arc<dyn RulesetOverrides>,
    ) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn build(self) -> Result<Arc<Scheduler>> {
        self.config.validate()?;
        let analyzer = self
            .analyzer
            .ok_or_else(|| Error::Fatal("SchedulerBuilder requires an analyzer".to_string()))?;
        let overrides = self.overrides.unwrap_or_else(|| Arc::new(NoOverrides));

        Ok(Scheduler::spawn(self.config, analyzer, overrides))
    }
}

/// Incremental background analysis scheduler.
///
/// Owns all shared state; constructed through [`SchedulerBuilder`].
pub struct Scheduler {
    config: SchedulerConfig,
    queue: WorkQueue,
    results: ResultStore,
    /// Units announced by the source model; snapshot updated on change
    /// events so re-enqueues always copy the latest known state.
    units: DashMap<UnitId, AnalysisUnit>,
    /// Globally registered diagnostic providers, unioned with per-unit
    /// analyzers at invocation time.
    providers: RwLock<Vec<AnalyzerId>>,
    analyzer: Arc<dyn Analyzer>,
    overrides: Arc<dyn RulesetOverrides>,
    /// Flipped once after the one-time bulk enqueue; queries gate on it so
    /// they never report "no results" before the workspace is populated.
    initial_load_tx: watch::Sender<bool>,
    shutdown_signal: CancellationToken,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    fn spawn(
        config: SchedulerConfig,
        analyzer: Arc<dyn Analyzer>,
        overrides: Arc<dyn RulesetOverrides>,
    ) -> Arc<Self> {
        let (initial_load_tx, _initial_load_rx) = watch::channel(false);

        let scheduler = Arc::new(Scheduler {
            config,
            queue: WorkQueue::new(),
            results: ResultStore::new(),
            units: DashMap::new(),
            providers: RwLock::new(Vec::new()),
            analyzer,
            overrides,
            initial_load_tx,
            shutdown_signal: CancellationToken::new(),
            loop_handle: Mutex::new(None),
        });

        let handle = tokio::spawn(Arc::clone(&scheduler).run_loop());
        *scheduler.loop_handle.lock() = Some(handle);

        info!(
            debounce_window_ms = scheduler.config.debounce_window_ms,
            cycle_interval_ms = scheduler.config.cycle_interval_ms,
            max_batch_size = scheduler.config.max_batch_size,
            "analysis scheduler started"
        );
        scheduler
    }

    //-----------------------------------------------------------
    // Change notifier surface

    /// Registers a unit announced by the source model. Does not enqueue.
    pub fn on_unit_added(
        &self,
        unit: AnalysisUnit,
    ) {
        debug!(unit = %unit.id, "unit added");
        self.units.insert(unit.id.clone(), unit);
    }

    /// Records an edit: updates the known snapshot and enqueues the unit.
    ///
    /// Change events for units the source model never announced are logged
    /// and ignored; they race unit removal. Edits arriving after shutdown
    /// are dropped, since the loop will never drain them.
    pub fn on_unit_changed(
        &self,
        id: &UnitId,
        snapshot: UnitSnapshot,
    ) {
        if self.shutdown_signal.is_cancelled() {
            warn!(unit = %id, "{}", SchedulerError::ShuttingDown);
            return;
        }
        let unit = match self.units.get_mut(id) {
            Some(mut known) => {
                known.snapshot = snapshot;
                known.clone()
            }
            None => {
                warn!(unit = %id, "change event for unknown unit ignored");
                return;
            }
        };
        self.queue.enqueue(unit);
    }

    /// One-time bulk enqueue of every known unit, then opens the query gate.
    ///
    /// Idempotent: repeat calls only re-enqueue.
    pub fn on_initial_load_complete(
        &self,
        all_units: Vec<AnalysisUnit>,
    ) {
        if *self.initial_load_tx.borrow() {
            debug!(units = all_units.len(), "initial load already signalled, re-enqueueing");
        } else {
            info!(units = all_units.len(), "initial load complete, bulk enqueue");
        }

        for unit in all_units {
            self.units.insert(unit.id.clone(), unit.clone());
            self.queue.enqueue(unit);
        }
        self.initial_load_tx.send_replace(true);
    }

    /// Explicit re-analysis trigger for request handlers. No-op after
    /// shutdown.
    pub fn enqueue_units(
        &self,
        units: Vec<AnalysisUnit>,
    ) {
        if self.shutdown_signal.is_cancelled() {
            warn!(units = units.len(), "{}", SchedulerError::ShuttingDown);
            return;
        }
        for unit in units {
            self.units.insert(unit.id.clone(), unit.clone());
            self.queue.enqueue(unit);
        }
    }

    /// Adds a globally registered diagnostic provider.
    pub fn register_provider(
        &self,
        id: AnalyzerId,
    ) {
        let mut providers = self.providers.write();
        if !providers.contains(&id) {
            providers.push(id);
        }
    }

    //-----------------------------------------------------------
    // Query API

    /// Returns the best-available diagnostics for `unit_ids` within
    /// `wait_bound` (the configured query timeout when `None`).
    ///
    /// Waits first for the one-time bulk enqueue, then — in parallel, each
    /// against the same absolute deadline — for every requested unit whose
    /// current generation is still unsettled. A timed-out wait is logged at
    /// warning level and degrades the answer to stale or partial data; the
    /// call never blocks beyond the bound, regardless of backlog size or
    /// analyzer latency.
    pub async fn request_diagnostics(
        &self,
        unit_ids: &[UnitId],
        wait_bound: Option<Duration>,
    ) -> Vec<Diagnostic> {
        let bound = wait_bound.unwrap_or_else(|| self.config.query_timeout());
        let deadline = Instant::now() + bound;

        let mut loaded = self.initial_load_tx.subscribe();
        if timeout_at(deadline, loaded.wait_for(|loaded| *loaded)).await.is_err() {
            warn!(
                "{}",
                SchedulerError::WaitTimeout {
                    what: "initial workspace load",
                    bound,
                }
            );
        }

        let waits = unit_ids.iter().filter_map(|id| {
            let signal = self.queue.live_signal(id).filter(|signal| !signal.is_released())?;
            let id = id.clone();
            Some(async move {
                let remaining = deadline.duration_since(Instant::now());
                if !signal.wait_released(remaining).await {
                    warn!(
                        unit = %id,
                        "{}",
                        SchedulerError::WaitTimeout {
                            what: "in-flight analysis",
                            bound,
                        }
                    );
                }
            })
        });
        join_all(waits).await;

        self.results.collect(unit_ids)
    }

    /// Latest published entry for a unit, if any analysis has completed.
    pub fn latest_result(
        &self,
        id: &UnitId,
    ) -> Option<ResultEntry> {
        self.results.get(id)
    }

    /// Current registry copy of a unit.
    pub fn known_unit(
        &self,
        id: &UnitId,
    ) -> Option<AnalysisUnit> {
        self.units.get(id).map(|unit| unit.clone())
    }

    pub fn initial_load_complete(&self) -> bool {
        *self.initial_load_tx.borrow()
    }

    //-----------------------------------------------------------
    // Lifecycle

    /// Signals the loop to stop and waits for it to wind down. In-flight
    /// analyses observe their cancellation token and finish cooperatively.
    pub async fn shutdown(&self) {
        info!("scheduler shutdown requested");
        self.shutdown_signal.cancel();

        let handle = self.loop_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("scheduler loop task failed on shutdown: {e}");
            }
        }
    }

    //-----------------------------------------------------------
    // Scheduler loop

    async fn run_loop(self: Arc<Self>) {
        let cycle_interval = self.config.cycle_interval();
        loop {
            // A fault in cycle bookkeeping must never terminate the loop.
            if let Err(e) = Arc::clone(&self).run_cycle().await {
                error!("scheduler cycle fault, continuing: {e}");
            }

            tokio::select! {
                biased;
                _ = self.shutdown_signal.cancelled() => {
                    info!("scheduler loop: shutdown signal received");
                    return;
                }
                _ = sleep(cycle_interval) => {}
            }
        }
    }

    /// One drain-dispatch-join cycle.
    async fn run_cycle(self: Arc<Self>) -> Result<()> {
        let batch = self
            .queue
            .drain_ready(self.config.max_batch_size, self.config.debounce_window());
        if batch.is_empty() {
            return Ok(());
        }
        debug!(batch = batch.len(), backlog = self.queue.len(), "dispatching analysis batch");

        let mut running = Vec::with_capacity(batch.len());
        for item in batch {
            let scheduler = Arc::clone(&self);
            let signal = item.signal.clone();
            let handle = tokio::spawn(async move { scheduler.analyze_one(item).await });
            running.push((signal, handle));
        }

        let mut fault: Option<SchedulerError> = None;
        for (signal, handle) in running {
            if let Err(e) = handle.await {
                // A panicked analysis task must not leave its waiters
                // starving; release here keeps exactly-once semantics.
                signal.release();
                fault.get_or_insert(SchedulerError::TaskFailed(e));
            }
        }

        match fault {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Runs one drained item to completion and publishes its outcome.
    ///
    /// The completion signal is released on every path so no query waiter
    /// starves; a failed pass keeps the unit's previous entry.
    async fn analyze_one(
        &self,
        item: WorkItem,
    ) {
        match self.analyze_inner(&item).await {
            Ok(count) => {
                debug!(unit = %item.unit.id, diagnostics = count, "analysis complete");
            }
            Err(e) => {
                warn!(unit = %item.unit.id, "analysis failed, keeping previous results: {e}");
            }
        }
        item.signal.release();
    }

    async fn analyze_inner(
        &self,
        item: &WorkItem,
    ) -> Result<usize> {
        let unit = &item.unit;
        let effective = self.effective_analyzers(unit);

        let diagnostics: Vec<Diagnostic> = if effective.is_empty() {
            // No provider applies: publish an empty result without paying
            // for a compilation pass.
            Vec::new()
        } else {
            let adjusted = self.overrides.apply_overrides(unit.clone());
            self.analyzer
                .analyze(&adjusted, &effective, self.shutdown_signal.child_token())
                .await?
        };

        let diagnostics = diagnostics
            .into_iter()
            .map(|mut diagnostic| {
                diagnostic.unit_name = unit.name.clone();
                diagnostic
            })
            .collect::<Vec<_>>();
        let count = diagnostics.len();

        self.results.publish(ResultEntry {
            unit_id: unit.id.clone(),
            unit_name: unit.name.clone(),
            diagnostics,
            produced_at: SystemTime::now(),
            snapshot_version: unit.snapshot.version,
        });
        Ok(count)
    }

    /// Union of globally registered providers and unit-attached analyzers,
    /// deduplicated in registration order.
    fn effective_analyzers(
        &self,
        unit: &AnalysisUnit,
    ) -> Vec<AnalyzerId> {
        let mut effective = self.providers.read().clone();
        for id in &unit.analyzers {
            if !effective.contains(id) {
                effective.push(id.clone());
            }
        }
        effective
    }
}
