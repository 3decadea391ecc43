use crate::governance::{BeliefWeight, GovernanceContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Informational,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn penalty(self) -> f64 {
        match self {
            Self::Critical => 0.75,
            Self::High => 0.5,
            Self::Medium => 0.25,
            Self::Low => 0.1,
            Self::Informational => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Surface {
    Emotion,
    Trust,
    Invariant,
    Belief,
    LoopData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Misalignment {
    #[serde(rename = "type")]
    pub surface: Surface,
    pub description: String,
    pub expected: String,
    pub actual: String,
    pub severity: Severity,
}

impl Misalignment {
    pub fn new(
        surface: Surface,
        severity: Severity,
        description: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            surface,
            description: description.into(),
            expected: expected.into(),
            actual: actual.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DecisionPoint {
    PlanSelection,
    PlanRejection,
    PlanEscalation,
    DataUnavailable,
}

/// Retrospective alignment; `NotAvailable` serializes as `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "RawScore", try_from = "RawScore")]
pub enum AlignmentScore {
    Score(f64),
    NotAvailable,
}

impl AlignmentScore {
    /// `max(0, 1 - sum of penalties)`.
    pub fn from_misalignments(misalignments: &[Misalignment]) -> Self {
        let penalty: f64 = misalignments.iter().map(|m| m.severity.penalty()).sum();
        Self::Score((1.0 - penalty).clamp(0.0, 1.0))
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Score(v) => Some(v),
            Self::NotAvailable => None,
        }
    }
}

impl std::fmt::Display for AlignmentScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Score(v) => write!(f, "{v:.2}"),
            Self::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

const NOT_AVAILABLE: &str = "N/A";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawScore {
    Number(f64),
    Label(String),
}

impl From<AlignmentScore> for RawScore {
    fn from(score: AlignmentScore) -> Self {
        match score {
            AlignmentScore::Score(v) => Self::Number(v),
            AlignmentScore::NotAvailable => Self::Label(NOT_AVAILABLE.to_string()),
        }
    }
}

impl TryFrom<RawScore> for AlignmentScore {
    type Error = String;

    fn try_from(raw: RawScore) -> Result<Self, Self::Error> {
        match raw {
            RawScore::Number(v) => Ok(Self::Score(v)),
            RawScore::Label(label) if label == NOT_AVAILABLE => Ok(Self::NotAvailable),
            RawScore::Label(other) => Err(format!("unexpected alignment score {other:?}")),
        }
    }
}

/// Context the passes ran against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    #[serde(flatten)]
    pub context: GovernanceContext,
    pub belief_weights: Vec<BeliefWeight>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedPlanDetails {
    pub selected_plan_id: Option<String>,
    pub comparison_set_id: Option<String>,
    pub candidate_plan_ids: Vec<String>,
    pub rejected_plan_ids: Vec<String>,
    pub escalated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentLogEntry {
    pub log_entry_id: String,
    pub loop_id: String,
    pub decision_point: DecisionPoint,
    pub reconciliation_timestamp_utc: DateTime<Utc>,
    pub alignment_score: AlignmentScore,
    pub misalignments: Vec<Misalignment>,
    pub governance_context_snapshot: GovernanceSnapshot,
    pub processed_plan_details: ProcessedPlanDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn of(severity: Severity) -> Misalignment {
        Misalignment::new(Surface::Trust, severity, "d", "e", "a")
    }

    #[test]
    fn empty_list_scores_one() {
        assert_eq!(AlignmentScore::from_misalignments(&[]), AlignmentScore::Score(1.0));
    }

    #[test]
    fn single_critical_scores_quarter() {
        let score = AlignmentScore::from_misalignments(&[of(Severity::Critical)]);
        assert_eq!(score.value(), Some(0.25));
    }

    #[test]
    fn score_never_drops_below_zero() {
        let many = vec![of(Severity::Critical), of(Severity::High), of(Severity::Medium)];
        assert_eq!(AlignmentScore::from_misalignments(&many).value(), Some(0.0));
    }

    #[test]
    fn score_serializes_as_number_or_na() {
        assert_eq!(serde_json::to_string(&AlignmentScore::Score(0.5)).unwrap(), "0.5");
        assert_eq!(
            serde_json::to_string(&AlignmentScore::NotAvailable).unwrap(),
            "\"N/A\""
        );
        let parsed: AlignmentScore = serde_json::from_str("\"N/A\"").unwrap();
        assert_eq!(parsed, AlignmentScore::NotAvailable);
        assert!(serde_json::from_str::<AlignmentScore>("\"soon\"").is_err());
    }
}
