//! Seams to the external analysis engine and the ruleset override service.
//!
//! Both are opaque capabilities consumed through traits so hosts can plug
//! their own compilation pipeline in and tests can substitute fakes.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;

use crate::AnalysisUnit;
use crate::AnalyzerId;
use crate::Diagnostic;
use crate::Result;

/// The opaque compile-and-analyze capability: unit in, diagnostics out.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Analyzer: Send + Sync + 'static {
    /// Runs the full semantic pass for `unit` with the given analyzer set.
    ///
    /// May take seconds. Observes `cancel` cooperatively; fails with
    /// [`AnalysisError`](crate::AnalysisError) on compile error or
    /// cancellation.
    async fn analyze(
        &self,
        unit: &AnalysisUnit,
        analyzers: &[AnalyzerId],
        cancel: CancellationToken,
    ) -> Result<Vec<Diagnostic>>;
}

/// Per-unit severity/ruleset adjustment, applied before every invocation so
/// the pass always reflects the current configuration.
#[cfg_attr(test, automock)]
pub trait RulesetOverrides: Send + Sync + 'static {
    /// Pure transform; must not retain the unit.
    fn apply_overrides(
        &self,
        unit: AnalysisUnit,
    ) -> AnalysisUnit;
}

/// Pass-through for hosts without a ruleset service.
#[derive(Debug, Default)]
pub struct NoOverrides;

impl RulesetOverrides for NoOverrides {
    fn apply_overrides(
        &self,
        unit: AnalysisUnit,
    ) -> AnalysisUnit {
        unit
    }
}
