// -
// Scheduler tuning defaults

/// Minimum quiet time after the last edit before a unit is analysis-eligible
pub(crate) const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 500;

/// Delay between scheduler cycles
pub(crate) const DEFAULT_CYCLE_INTERVAL_MS: u64 = 200;

/// Concurrent analyses launched per cycle; deliberate backpressure against
/// heavy compilation on large workspaces
pub(crate) const DEFAULT_MAX_BATCH_SIZE: usize = 2;

/// Bound on query waits when the caller does not supply one
pub(crate) const DEFAULT_QUERY_TIMEOUT_MS: u64 = 30_000;
