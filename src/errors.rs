//! Analysis Scheduler Error Hierarchy
//!
//! Defines the error types of the background analysis engine, categorized
//! by where they are handled: per-unit analysis failures are recovered
//! inside the scheduler loop, wait timeouts degrade queries to
//! best-available data, and only fatal errors propagate to the host.

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A unit's compile-and-analyze pass failed; recovered locally by the
    /// scheduler loop (logged, completion signal still released, previous
    /// results kept)
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Scheduler lifecycle and bounded-wait failures
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring process-level handling
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The semantic pass for a unit threw
    #[error("Analysis of unit '{unit}' failed: {reason}")]
    Failed { unit: String, reason: String },

    /// The semantic pass observed its cancellation token
    #[error("Analysis of unit '{unit}' was cancelled")]
    Cancelled { unit: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A bounded wait elapsed; the caller still receives best-available data
    #[error("Wait for {what} exceeded {bound:?}")]
    WaitTimeout { what: &'static str, bound: Duration },

    /// Work arrived after shutdown was requested; it is logged and dropped
    /// since the loop will never drain it
    #[error("Scheduler is shutting down")]
    ShuttingDown,

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),
}
