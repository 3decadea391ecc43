//! Failure classification and recovery routing.

mod classifier;
mod extract;
mod recovery;

pub use classifier::{
    FailureClassifier, FailureKind, FailureMatcher, FailureSignature, KeywordMatcher, RootCause,
};
pub use extract::FailureDetails;
pub use recovery::{PatchPlan, build_patch_plan, map_failure_to_agent};

use crate::audit::{AuditStore, LogName};
use crate::clock::{Clock, system_clock};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One classified failure event for a loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebuggerReport {
    pub loop_id: String,
    pub timestamp: DateTime<Utc>,
    pub failure_type: FailureKind,
    pub details: FailureDetails,
    pub suggested_fix: String,
    pub patch_plan: PatchPlan,
    pub next_agent: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_context: Option<serde_json::Value>,
}

pub struct Debugger {
    classifier: FailureClassifier,
    store: Arc<AuditStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Debugger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debugger")
            .field("signatures", &self.classifier.len())
            .finish_non_exhaustive()
    }
}

impl Debugger {
    pub fn new(store: Arc<AuditStore>) -> Self {
        Self::with_classifier(store, FailureClassifier::default())
    }

    pub fn with_classifier(store: Arc<AuditStore>, classifier: FailureClassifier) -> Self {
        Self {
            classifier,
            store,
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn parse_failure_evidence(&self, evidence: &str) -> RootCause {
        self.classifier.classify(evidence)
    }

    /// Classify `evidence`, draft the recovery plan and append the report to
    /// the loop's failure history.
    pub fn record_debugger_report(
        &self,
        loop_id: &str,
        evidence: &str,
        loop_context: Option<serde_json::Value>,
    ) -> Result<DebuggerReport, StoreError> {
        let root_cause = self.parse_failure_evidence(evidence);
        let patch_plan = build_patch_plan(&root_cause);

        let report = DebuggerReport {
            loop_id: loop_id.to_string(),
            timestamp: self.clock.now(),
            failure_type: root_cause.failure_type.clone(),
            details: root_cause.details,
            suggested_fix: root_cause.suggested_fix,
            next_agent: patch_plan.next_agent.clone(),
            confidence: root_cause.confidence,
            patch_plan,
            loop_context,
        };

        tracing::warn!(
            loop_id,
            failure_type = %report.failure_type,
            next_agent = %report.next_agent,
            confidence = report.confidence,
            "loop failure classified"
        );
        self.store.append(LogName::DebuggerReports, &report)?;
        Ok(report)
    }

    /// Reports recorded for `loop_id`, oldest first.
    pub fn failure_history(&self, loop_id: &str) -> Vec<DebuggerReport> {
        self.store
            .read_log::<DebuggerReport>(LogName::DebuggerReports)
            .into_iter()
            .filter(|r| r.loop_id == loop_id)
            .collect()
    }
}
