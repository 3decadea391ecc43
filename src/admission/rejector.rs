use super::types::{Condition, PlanEvaluation, RejectionRecord, RejectionTrigger, ThresholdDetails};
use crate::audit::LogName;
use crate::clock::{Clock, system_clock};
use crate::config::AdmissionConfig;
use crate::error::StoreError;
use crate::governance::{ContextReader, GovernanceContext};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Every threshold the context breaches, in check order: emotion valence,
/// arousal under negative valence, trust, critical invariants, non-critical
/// invariants.
pub fn rejection_triggers(
    ctx: &GovernanceContext,
    thresholds: &AdmissionConfig,
) -> Vec<RejectionTrigger> {
    let mut triggers = Vec::new();
    let emotion = &ctx.emotion_state;

    if emotion.valence < thresholds.min_negative_valence {
        triggers.push(trigger(
            format!(
                "emotion valence {:.2} below floor {:.2}",
                emotion.valence, thresholds.min_negative_valence
            ),
            "emotion_state.valence",
            thresholds.min_negative_valence,
            emotion.valence,
            Condition::LessThan,
        ));
    }
    if let Some(positive) = emotion.positive_valence
        && positive < thresholds.min_positive_valence
    {
        triggers.push(trigger(
            format!(
                "positive valence {positive:.2} below floor {:.2}",
                thresholds.min_positive_valence
            ),
            "emotion_state.positive_valence",
            thresholds.min_positive_valence,
            positive,
            Condition::LessThan,
        ));
    }
    if emotion.valence < 0.0 && emotion.arousal > thresholds.max_arousal_under_negative_valence {
        triggers.push(trigger(
            format!(
                "arousal {:.2} above cap {:.2} under negative valence",
                emotion.arousal, thresholds.max_arousal_under_negative_valence
            ),
            "emotion_state.arousal",
            thresholds.max_arousal_under_negative_valence,
            emotion.arousal,
            Condition::GreaterThan,
        ));
    }
    if ctx.trust_score < thresholds.min_trust_score {
        triggers.push(trigger(
            format!(
                "trust score {:.2} below floor {:.2}",
                ctx.trust_score, thresholds.min_trust_score
            ),
            "trust_score",
            thresholds.min_trust_score,
            ctx.trust_score,
            Condition::LessThan,
        ));
    }
    if ctx.critical_invariant_violations > thresholds.max_critical_invariant_violations {
        triggers.push(trigger(
            format!(
                "{} critical invariant violation(s), {} tolerated",
                ctx.critical_invariant_violations, thresholds.max_critical_invariant_violations
            ),
            "invariants.critical_violations",
            f64::from(thresholds.max_critical_invariant_violations),
            f64::from(ctx.critical_invariant_violations),
            Condition::GreaterThan,
        ));
    }
    if ctx.non_critical_invariant_violations > thresholds.max_non_critical_invariant_violations {
        triggers.push(trigger(
            format!(
                "{} non-critical invariant violation(s), cap {}",
                ctx.non_critical_invariant_violations,
                thresholds.max_non_critical_invariant_violations
            ),
            "invariants.non_critical_violations",
            f64::from(thresholds.max_non_critical_invariant_violations),
            f64::from(ctx.non_critical_invariant_violations),
            Condition::GreaterThan,
        ));
    }

    triggers
}

fn trigger(
    reason: String,
    metric_path: &str,
    threshold_value: f64,
    actual_value: f64,
    condition: Condition,
) -> RejectionTrigger {
    RejectionTrigger {
        reason,
        threshold_details: ThresholdDetails {
            metric_path: metric_path.to_string(),
            threshold_value,
            actual_value,
            condition,
        },
    }
}

/// Rejects selected plans whose governance context breaches a threshold.
#[derive(Debug, Clone)]
pub struct PlanRejector {
    reader: ContextReader,
    thresholds: AdmissionConfig,
    clock: Arc<dyn Clock>,
}

impl PlanRejector {
    pub fn new(reader: ContextReader, thresholds: AdmissionConfig) -> Self {
        Self {
            reader,
            thresholds,
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Evaluate one plan against the loop's current context. Nothing is logged.
    pub fn evaluate_plan(
        &self,
        loop_id: &str,
        plan_id: &str,
        comparison_set_id: &str,
    ) -> PlanEvaluation {
        let ctx = self.reader.context_for(loop_id, Some(plan_id));
        self.evaluate_with_context(loop_id, plan_id, comparison_set_id, ctx)
    }

    pub fn evaluate_with_context(
        &self,
        loop_id: &str,
        plan_id: &str,
        comparison_set_id: &str,
        ctx: GovernanceContext,
    ) -> PlanEvaluation {
        let all_rejection_triggers = rejection_triggers(&ctx, &self.thresholds);
        let Some(primary) = all_rejection_triggers.first().cloned() else {
            debug!(loop_id, plan_id, "plan approved");
            return PlanEvaluation::approved();
        };

        PlanEvaluation {
            rejected: true,
            record: Some(RejectionRecord {
                log_entry_id: Uuid::new_v4().to_string(),
                loop_id: loop_id.to_string(),
                plan_id: plan_id.to_string(),
                comparison_set_id: comparison_set_id.to_string(),
                rejection_reason: primary.reason,
                triggering_metric: primary.threshold_details.metric_path.clone(),
                threshold_details: primary.threshold_details,
                timestamp: self.clock.now(),
                governance_context: ctx,
                all_rejection_triggers,
            }),
        }
    }

    /// Evaluate the loop's most recently selected plan and log a rejection.
    pub fn process_rejection_for_loop(
        &self,
        loop_id: &str,
    ) -> Result<Option<RejectionRecord>, StoreError> {
        let Some(selection) = self.reader.latest_selection(loop_id) else {
            debug!(loop_id, "no plan selection recorded");
            return Ok(None);
        };
        let evaluation = self.evaluate_plan(
            loop_id,
            &selection.selected_plan_id,
            &selection.comparison_set_id,
        );
        match evaluation.record {
            Some(record) => {
                self.log_rejection(&record)?;
                Ok(Some(record))
            }
            None => {
                info!(loop_id, plan_id = %selection.selected_plan_id, "selected plan approved");
                Ok(None)
            }
        }
    }

    /// Evaluate every candidate of the loop's latest comparison set and log
    /// each rejection. Returns the rejections in candidate order.
    pub fn evaluate_comparison_set(&self, loop_id: &str) -> Result<Vec<RejectionRecord>, StoreError> {
        let Some(set) = self.reader.latest_comparison_set(loop_id) else {
            debug!(loop_id, "no comparison set recorded");
            return Ok(Vec::new());
        };

        let mut rejections = Vec::new();
        for candidate in &set.candidate_plans {
            let evaluation =
                self.evaluate_plan(loop_id, &candidate.plan_id, &set.comparison_set_id);
            if let Some(record) = evaluation.record {
                self.log_rejection(&record)?;
                rejections.push(record);
            }
        }
        Ok(rejections)
    }

    fn log_rejection(&self, record: &RejectionRecord) -> Result<(), StoreError> {
        warn!(
            loop_id = %record.loop_id,
            plan_id = %record.plan_id,
            metric = %record.triggering_metric,
            triggers = record.all_rejection_triggers.len(),
            "plan rejected: {}",
            record.rejection_reason
        );
        self.reader.store().append(LogName::PlanRejections, record)
    }
}
