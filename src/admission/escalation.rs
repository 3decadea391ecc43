use super::types::{
    EscalationAction, EscalationRecord, FallbackPolicy, GovernanceSummary, RejectionRecord,
};
use crate::audit::LogName;
use crate::clock::{Clock, system_clock};
use crate::error::StoreError;
use crate::governance::ContextReader;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Fires when every candidate of a loop's comparison set has been rejected.
#[derive(Debug, Clone)]
pub struct EscalationDetector {
    reader: ContextReader,
    policy: FallbackPolicy,
    clock: Arc<dyn Clock>,
}

impl EscalationDetector {
    pub fn new(reader: ContextReader, policy: FallbackPolicy) -> Self {
        Self {
            reader,
            policy,
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Escalation for the loop's latest comparison set, or `None` when any
    /// candidate is still unrejected or the set data is missing. An escalation
    /// already on record for the same (loop, comparison set) is returned as is.
    pub fn check_for_escalation(
        &self,
        loop_id: &str,
    ) -> Result<Option<EscalationRecord>, StoreError> {
        let Some(set) = self.reader.latest_comparison_set(loop_id) else {
            debug!(loop_id, "no comparison set; escalation not evaluated");
            return Ok(None);
        };
        let candidates = set.candidate_ids();
        if candidates.is_empty() {
            debug!(loop_id, comparison_set_id = %set.comparison_set_id, "comparison set has no candidates");
            return Ok(None);
        }

        let store = self.reader.store();
        let rejected: HashSet<String> = store
            .read_log::<RejectionRecord>(LogName::PlanRejections)
            .into_iter()
            .filter(|r| r.loop_id == loop_id && r.comparison_set_id == set.comparison_set_id)
            .map(|r| r.plan_id)
            .collect();

        if !candidates.iter().all(|id| rejected.contains(id)) {
            debug!(
                loop_id,
                candidates = candidates.len(),
                rejected = rejected.len(),
                "partial rejection; no escalation"
            );
            return Ok(None);
        }

        if let Some(existing) = store
            .read_log::<EscalationRecord>(LogName::PlanEscalations)
            .into_iter()
            .find(|e| e.loop_id == loop_id && e.comparison_set_id == set.comparison_set_id)
        {
            debug!(loop_id, "escalation already recorded");
            return Ok(Some(existing));
        }

        let (recommended_action, operator_alert_flag, fallback_triggered, fallback_details) =
            match self.policy {
                FallbackPolicy::Disabled => (
                    EscalationAction::OperatorReviewRequired,
                    true,
                    false,
                    "fallback disabled; operator review required".to_string(),
                ),
                FallbackPolicy::LogAndAlertOperator => (
                    EscalationAction::OperatorReviewRequired,
                    true,
                    false,
                    "fallback policy log_and_alert_operator: escalation logged, operator alerted"
                        .to_string(),
                ),
                FallbackPolicy::AttemptRegenerationSimple => (
                    EscalationAction::TriggerFallbackProcedure,
                    false,
                    true,
                    format!(
                        "simple plan regeneration requested for comparison set {}",
                        set.comparison_set_id
                    ),
                ),
            };

        let record = EscalationRecord {
            log_entry_id: Uuid::new_v4().to_string(),
            loop_id: loop_id.to_string(),
            comparison_set_id: set.comparison_set_id.clone(),
            escalation_reason: format!(
                "all {} candidate plans rejected by governance thresholds",
                candidates.len()
            ),
            governance_summary: GovernanceSummary {
                total_plans_considered: candidates.len(),
                total_plans_rejected: candidates.len(),
            },
            rejected_plan_ids: candidates,
            recommended_action,
            operator_alert_flag,
            fallback_triggered,
            fallback_details,
            timestamp: self.clock.now(),
        };

        warn!(
            loop_id,
            comparison_set_id = %record.comparison_set_id,
            action = %record.recommended_action,
            policy = %self.policy,
            "plan escalation raised"
        );
        store.append(LogName::PlanEscalations, &record)?;
        Ok(Some(record))
    }
}
