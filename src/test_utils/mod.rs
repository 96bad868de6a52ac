//! the test_utils folder here will share utils or test components between
//! unit tests

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::AnalysisError;
use crate::AnalysisUnit;
use crate::Analyzer;
use crate::AnalyzerId;
use crate::Diagnostic;
use crate::Result;
use crate::Severity;
use crate::UnitId;
use crate::UnitSnapshot;

pub fn test_unit(
    id: &str,
    version: u64,
) -> AnalysisUnit {
    AnalysisUnit {
        id: UnitId::from(id),
        name: format!("unit-{id}"),
        snapshot: UnitSnapshot::new(version, format!("fp-{id}-v{version}")),
        analyzers: Vec::new(),
    }
}

pub fn test_diagnostic(
    id: &str,
    message: &str,
) -> Diagnostic {
    Diagnostic {
        file: format!("src/{id}.x"),
        start_line: 1,
        start_col: 1,
        end_line: 1,
        end_col: 10,
        message: message.to_string(),
        id: id.to_string(),
        severity: Severity::Warning,
        unit_name: String::new(),
    }
}

/// One observed `analyze` invocation.
#[derive(Debug, Clone)]
pub struct AnalyzeCall {
    pub unit_id: UnitId,
    pub unit_name: String,
    pub snapshot_version: u64,
    pub analyzers: Vec<AnalyzerId>,
}

/// Scriptable [`Analyzer`] fake recording every invocation.
///
/// By default each call succeeds with one synthetic diagnostic per unit.
/// Units can be scripted to fail (synthetic compile error), to panic, or to
/// hang until their cancellation token fires.
#[derive(Default)]
pub struct RecordingAnalyzer {
    calls: Mutex<Vec<AnalyzeCall>>,
    failing: Mutex<HashSet<UnitId>>,
    panicking: Mutex<HashSet<UnitId>>,
    hanging: Mutex<HashSet<UnitId>>,
    slow: Mutex<HashMap<UnitId, Duration>>,
}

impl RecordingAnalyzer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_unit(
        &self,
        id: UnitId,
    ) {
        self.failing.lock().insert(id);
    }

    pub fn panic_unit(
        &self,
        id: UnitId,
    ) {
        self.panicking.lock().insert(id);
    }

    pub fn hang_unit(
        &self,
        id: UnitId,
    ) {
        self.hanging.lock().insert(id);
    }

    pub fn slow_unit(
        &self,
        id: UnitId,
        latency: Duration,
    ) {
        self.slow.lock().insert(id, latency);
    }

    pub fn calls(&self) -> Vec<AnalyzeCall> {
        self.calls.lock().clone()
    }

    pub fn calls_for(
        &self,
        id: &UnitId,
    ) -> usize {
        self.calls.lock().iter().filter(|call| &call.unit_id == id).count()
    }
}

#[async_trait]
impl Analyzer for RecordingAnalyzer {
    async fn analyze(
        &self,
        unit: &AnalysisUnit,
        analyzers: &[AnalyzerId],
        cancel: CancellationToken,
    ) -> Result<Vec<Diagnostic>> {
        self.calls.lock().push(AnalyzeCall {
            unit_id: unit.id.clone(),
            unit_name: unit.name.clone(),
            snapshot_version: unit.snapshot.version,
            analyzers: analyzers.to_vec(),
        });

        let latency = self.slow.lock().get(&unit.id).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.hanging.lock().contains(&unit.id) {
            cancel.cancelled().await;
            return Err(AnalysisError::Cancelled {
                unit: unit.id.to_string(),
            }
            .into());
        }

        if self.panicking.lock().contains(&unit.id) {
            panic!("synthetic analyzer panic for {}", unit.id);
        }

        if self.failing.lock().contains(&unit.id) {
            return Err(AnalysisError::Failed {
                unit: unit.id.to_string(),
                reason: "synthetic compile failure".to_string(),
            }
            .into());
        }

        Ok(vec![test_diagnostic(
            unit.id.as_str(),
            &format!("issue in {} at v{}", unit.id, unit.snapshot.version),
        )])
    }
}
