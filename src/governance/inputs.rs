use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::Display;

/// The planner's pick for a loop decision point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSelection {
    pub loop_id: String,
    pub selected_plan_id: String,
    pub comparison_set_id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePlanSummary {
    pub plan_id: String,
    #[serde(default)]
    pub weighted_score: f64,
    #[serde(default)]
    pub trust_alignment_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSet {
    pub comparison_set_id: String,
    pub loop_id: String,
    #[serde(default)]
    pub candidate_plans: Vec<CandidatePlanSummary>,
}

impl ComparisonSet {
    pub fn candidate_ids(&self) -> Vec<String> {
        self.candidate_plans.iter().map(|p| p.plan_id.clone()).collect()
    }

    pub fn candidate(&self, plan_id: &str) -> Option<&CandidatePlanSummary> {
        self.candidate_plans.iter().find(|p| p.plan_id == plan_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionState {
    #[serde(default)]
    pub valence: f64,
    #[serde(default)]
    pub arousal: f64,
    /// Strength of the positive component, when the tracker reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive_valence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_emotion: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmotionStateIndex {
    #[serde(default)]
    pub current: Option<EmotionState>,
    #[serde(default)]
    pub loops: BTreeMap<String, EmotionState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustStateIndex {
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub loops: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvariantSeverity {
    Critical,
    #[default]
    NonCritical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantDefinition {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: InvariantSeverity,
}

/// An invariant breach observed during a loop. Without `plan_id` it applies
/// to every plan of the loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantViolationRecord {
    pub loop_id: String,
    #[serde(default)]
    pub plan_id: Option<String>,
    pub invariant_id: String,
    /// Falls back to the catalogue entry when absent.
    #[serde(default)]
    pub severity: Option<InvariantSeverity>,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefWeight {
    pub belief: String,
    #[serde(default = "default_belief_weight")]
    pub weight: f64,
}

fn default_belief_weight() -> f64 {
    1.0
}

/// Narrative written at the end of a loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSummary {
    pub loop_id: String,
    pub summary: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}
