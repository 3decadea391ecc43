//! Offline replay of a loop's decision trail against its governance state.

mod passes;
mod types;

pub use passes::{BELIEF_REFERENCE_SCORE, DecisionData};
pub use types::{
    AlignmentLogEntry, AlignmentScore, DecisionPoint, GovernanceSnapshot, Misalignment,
    ProcessedPlanDetails, Severity, Surface,
};

use crate::admission::{EscalationRecord, RejectionRecord};
use crate::audit::LogName;
use crate::clock::{Clock, system_clock};
use crate::config::{AdmissionConfig, ReconcilerConfig};
use crate::error::StoreError;
use crate::governance::ContextReader;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Reconciler {
    reader: ContextReader,
    thresholds: AdmissionConfig,
    config: ReconcilerConfig,
    clock: Arc<dyn Clock>,
}

impl Reconciler {
    pub fn new(reader: ContextReader, thresholds: AdmissionConfig, config: ReconcilerConfig) -> Self {
        Self {
            reader,
            thresholds,
            config,
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn decision_data(&self, loop_id: &str) -> DecisionData {
        let store = self.reader.store();
        let selection = self.reader.latest_selection(loop_id);
        let comparison_set = self.reader.latest_comparison_set(loop_id);
        let rejections = store
            .read_log::<RejectionRecord>(LogName::PlanRejections)
            .into_iter()
            .filter(|r| r.loop_id == loop_id)
            .collect();
        let escalations = store
            .read_log::<EscalationRecord>(LogName::PlanEscalations)
            .into_iter()
            .filter(|e| e.loop_id == loop_id)
            .collect();
        DecisionData {
            selection,
            comparison_set,
            rejections,
            escalations,
        }
    }

    /// Replay one loop. Nothing is written.
    pub fn reconcile_loop(&self, loop_id: &str) -> AlignmentLogEntry {
        let data = self.decision_data(loop_id);
        let selected_plan = data.selection.as_ref().map(|s| s.selected_plan_id.as_str());
        let context = self.reader.context_for(loop_id, selected_plan);
        let belief_weights = self.reader.beliefs();

        let (decision_point, misalignments, alignment_score) = if data.is_empty() {
            warn!(loop_id, "no decision data for loop");
            (
                DecisionPoint::DataUnavailable,
                vec![Misalignment::new(
                    Surface::LoopData,
                    Severity::Critical,
                    "no decision data recorded for loop",
                    "selection, rejection or escalation records",
                    "none",
                )],
                AlignmentScore::NotAvailable,
            )
        } else {
            let summary = self.reader.summary_for(loop_id);
            let mut misalignments = passes::emotion_pass(&data, &context, &self.thresholds);
            misalignments.extend(passes::trust_pass(&data, &context, &self.thresholds));
            misalignments.extend(passes::invariant_pass(&data, &context, &self.thresholds));
            misalignments.extend(passes::belief_pass(
                summary.as_ref(),
                &belief_weights,
                self.config.belief_weight_floor,
            ));
            let score = AlignmentScore::from_misalignments(&misalignments);
            (decision_point(&data), misalignments, score)
        };

        let processed_plan_details = ProcessedPlanDetails {
            selected_plan_id: selected_plan.map(str::to_string),
            comparison_set_id: data
                .selection
                .as_ref()
                .map(|s| s.comparison_set_id.clone())
                .or_else(|| data.comparison_set.as_ref().map(|c| c.comparison_set_id.clone())),
            candidate_plan_ids: data
                .comparison_set
                .as_ref()
                .map(|c| c.candidate_ids())
                .unwrap_or_default(),
            rejected_plan_ids: data.rejections.iter().map(|r| r.plan_id.clone()).collect(),
            escalated: !data.escalations.is_empty(),
        };

        info!(
            loop_id,
            decision_point = %decision_point,
            score = %alignment_score,
            misalignments = misalignments.len(),
            "loop reconciled"
        );

        AlignmentLogEntry {
            log_entry_id: Uuid::new_v4().to_string(),
            loop_id: loop_id.to_string(),
            decision_point,
            reconciliation_timestamp_utc: self.clock.now(),
            alignment_score,
            misalignments,
            governance_context_snapshot: GovernanceSnapshot {
                context,
                belief_weights,
            },
            processed_plan_details,
        }
    }

    /// Reconcile the configured loops and rewrite the alignment log.
    pub fn run_reconciliation(&self) -> Result<Vec<AlignmentLogEntry>, StoreError> {
        self.run_reconciliation_for(&self.config.loop_ids)
    }

    /// Reconcile `loop_ids` and rewrite the alignment log once at the end.
    pub fn run_reconciliation_for(
        &self,
        loop_ids: &[String],
    ) -> Result<Vec<AlignmentLogEntry>, StoreError> {
        let entries: Vec<AlignmentLogEntry> =
            loop_ids.iter().map(|id| self.reconcile_loop(id)).collect();
        self.reader
            .store()
            .write_log(LogName::GovernanceAlignment, &entries)?;
        info!(loops = entries.len(), "reconciliation run written");
        Ok(entries)
    }
}

fn decision_point(data: &DecisionData) -> DecisionPoint {
    if !data.escalations.is_empty() {
        DecisionPoint::PlanEscalation
    } else if data.selection.is_some() {
        DecisionPoint::PlanSelection
    } else if !data.rejections.is_empty() {
        DecisionPoint::PlanRejection
    } else {
        DecisionPoint::DataUnavailable
    }
}

#[cfg(test)]
mod tests;
