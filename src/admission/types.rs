use crate::governance::GovernanceContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What happens once every candidate plan of a decision point is rejected.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FallbackPolicy {
    #[default]
    Disabled,
    LogAndAlertOperator,
    AttemptRegenerationSimple,
}

/// The comparison that failed: `actual <condition> threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Condition {
    LessThan,
    GreaterThan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdDetails {
    pub metric_path: String,
    pub threshold_value: f64,
    pub actual_value: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionTrigger {
    pub reason: String,
    pub threshold_details: ThresholdDetails,
}

/// One entry of the plan-rejection log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub log_entry_id: String,
    pub loop_id: String,
    pub plan_id: String,
    pub comparison_set_id: String,
    pub rejection_reason: String,
    pub triggering_metric: String,
    pub threshold_details: ThresholdDetails,
    pub timestamp: DateTime<Utc>,
    pub governance_context: GovernanceContext,
    pub all_rejection_triggers: Vec<RejectionTrigger>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEvaluation {
    pub rejected: bool,
    pub record: Option<RejectionRecord>,
}

impl PlanEvaluation {
    pub fn approved() -> Self {
        Self {
            rejected: false,
            record: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EscalationAction {
    OperatorReviewRequired,
    TriggerFallbackProcedure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSummary {
    pub total_plans_considered: usize,
    pub total_plans_rejected: usize,
}

/// One entry of the plan-escalation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub log_entry_id: String,
    pub loop_id: String,
    pub comparison_set_id: String,
    pub escalation_reason: String,
    pub rejected_plan_ids: Vec<String>,
    pub governance_summary: GovernanceSummary,
    pub recommended_action: EscalationAction,
    pub operator_alert_flag: bool,
    pub fallback_triggered: bool,
    pub fallback_details: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_policy_parses_snake_case() {
        assert_eq!(
            "log_and_alert_operator".parse::<FallbackPolicy>().unwrap(),
            FallbackPolicy::LogAndAlertOperator
        );
        assert!("sometimes".parse::<FallbackPolicy>().is_err());
    }

    #[test]
    fn escalation_action_serializes_snake_case() {
        let json = serde_json::to_string(&EscalationAction::OperatorReviewRequired).unwrap();
        assert_eq!(json, "\"operator_review_required\"");
    }
}
