//! The four independent reconciliation passes.

use super::types::{Misalignment, Severity, Surface};
use crate::admission::{EscalationRecord, RejectionRecord};
use crate::config::AdmissionConfig;
use crate::governance::{
    BeliefWeight, ComparisonSet, ContextSource, GovernanceContext, LoopSummary, PlanSelection,
};
use crate::historian::belief_score;

/// Belief scores at or below this count as unreferenced.
pub const BELIEF_REFERENCE_SCORE: f64 = 0.3;

/// Decision trail gathered for one loop.
#[derive(Debug, Clone, Default)]
pub struct DecisionData {
    pub selection: Option<PlanSelection>,
    pub comparison_set: Option<ComparisonSet>,
    pub rejections: Vec<RejectionRecord>,
    pub escalations: Vec<EscalationRecord>,
}

impl DecisionData {
    /// Candidate sets alone are not a decision.
    pub fn is_empty(&self) -> bool {
        self.selection.is_none() && self.rejections.is_empty() && self.escalations.is_empty()
    }

    fn selected_trust_alignment(&self) -> Option<f64> {
        let selection = self.selection.as_ref()?;
        self.comparison_set
            .as_ref()?
            .candidate(&selection.selected_plan_id)
            .map(|c| c.trust_alignment_score)
    }
}

pub fn emotion_pass(
    data: &DecisionData,
    ctx: &GovernanceContext,
    thresholds: &AdmissionConfig,
) -> Vec<Misalignment> {
    let mut found = Vec::new();
    let emotion = &ctx.emotion_state;

    if data.selection.is_some() {
        if emotion.valence < thresholds.min_negative_valence {
            found.push(Misalignment::new(
                Surface::Emotion,
                Severity::High,
                "plan selected while emotion valence was below the floor",
                format!("valence >= {}", thresholds.min_negative_valence),
                format!("valence = {}", emotion.valence),
            ));
        }
        if emotion.valence < 0.0 && emotion.arousal > thresholds.max_arousal_under_negative_valence
        {
            found.push(Misalignment::new(
                Surface::Emotion,
                Severity::Medium,
                "plan selected under high arousal with negative valence",
                format!("arousal <= {}", thresholds.max_arousal_under_negative_valence),
                format!("arousal = {}", emotion.arousal),
            ));
        }
    }
    if ctx.emotion_source == ContextSource::Default {
        found.push(Misalignment::new(
            Surface::Emotion,
            Severity::Informational,
            "no emotion state recorded; configured defaults assumed",
            "recorded emotion state",
            "defaults",
        ));
    }
    found
}

pub fn trust_pass(
    data: &DecisionData,
    ctx: &GovernanceContext,
    thresholds: &AdmissionConfig,
) -> Vec<Misalignment> {
    let mut found = Vec::new();
    let Some(selection) = &data.selection else {
        return found;
    };

    let selected_alignment = data.selected_trust_alignment();
    if let Some(alignment) = selected_alignment
        && alignment < thresholds.min_trust_score
    {
        found.push(Misalignment::new(
            Surface::Trust,
            Severity::High,
            format!(
                "selected plan {} has trust alignment below the floor",
                selection.selected_plan_id
            ),
            format!("trust_alignment_score >= {}", thresholds.min_trust_score),
            format!("trust_alignment_score = {alignment}"),
        ));
    }
    if ctx.trust_score < thresholds.min_trust_score {
        found.push(Misalignment::new(
            Surface::Trust,
            Severity::Medium,
            "plan selected while loop trust was below the floor",
            format!("trust_score >= {}", thresholds.min_trust_score),
            format!("trust_score = {}", ctx.trust_score),
        ));
    }

    if let (Some(selected), Some(set)) = (selected_alignment, &data.comparison_set) {
        for rejection in data
            .rejections
            .iter()
            .filter(|r| r.comparison_set_id == selection.comparison_set_id)
        {
            if let Some(candidate) = set.candidate(&rejection.plan_id)
                && candidate.trust_alignment_score > selected
            {
                found.push(Misalignment::new(
                    Surface::Trust,
                    Severity::Low,
                    format!(
                        "rejected plan {} was more trust-aligned than the selected plan",
                        candidate.plan_id
                    ),
                    format!("selected trust_alignment_score >= {}", candidate.trust_alignment_score),
                    format!("selected trust_alignment_score = {selected}"),
                ));
            }
        }
    }
    found
}

pub fn invariant_pass(
    data: &DecisionData,
    ctx: &GovernanceContext,
    thresholds: &AdmissionConfig,
) -> Vec<Misalignment> {
    let mut found = Vec::new();
    if data.selection.is_some() {
        if ctx.critical_invariant_violations > thresholds.max_critical_invariant_violations {
            found.push(Misalignment::new(
                Surface::Invariant,
                Severity::Critical,
                "plan selected despite critical invariant violations",
                format!(
                    "critical violations <= {}",
                    thresholds.max_critical_invariant_violations
                ),
                format!("critical violations = {}", ctx.critical_invariant_violations),
            ));
        }
        if ctx.non_critical_invariant_violations > thresholds.max_non_critical_invariant_violations
        {
            found.push(Misalignment::new(
                Surface::Invariant,
                Severity::Medium,
                "plan selected above the non-critical invariant cap",
                format!(
                    "non-critical violations <= {}",
                    thresholds.max_non_critical_invariant_violations
                ),
                format!(
                    "non-critical violations = {}",
                    ctx.non_critical_invariant_violations
                ),
            ));
        }
    }
    if !data.escalations.is_empty()
        && ctx.critical_invariant_violations == 0
        && ctx.non_critical_invariant_violations == 0
    {
        found.push(Misalignment::new(
            Surface::Invariant,
            Severity::Low,
            "loop escalated without any invariant violation; soft signals only",
            "invariant violation behind escalation",
            "none recorded",
        ));
    }
    found
}

pub fn belief_pass(
    summary: Option<&LoopSummary>,
    beliefs: &[BeliefWeight],
    weight_floor: f64,
) -> Vec<Misalignment> {
    let Some(summary) = summary else {
        return vec![Misalignment::new(
            Surface::Belief,
            Severity::Informational,
            "no loop summary recorded; beliefs not checked",
            "loop summary",
            "none",
        )];
    };

    beliefs
        .iter()
        .filter(|b| b.weight >= weight_floor)
        .filter_map(|b| {
            let score = belief_score(&summary.summary, &b.belief);
            (score <= BELIEF_REFERENCE_SCORE).then(|| {
                Misalignment::new(
                    Surface::Belief,
                    Severity::Low,
                    format!("high-weight belief not reflected in loop narrative: {}", b.belief),
                    format!("belief score > {BELIEF_REFERENCE_SCORE}"),
                    format!("belief score = {score:.2}"),
                )
            })
        })
        .collect()
}
