use super::inputs::{
    BeliefWeight, ComparisonSet, EmotionState, EmotionStateIndex, InvariantDefinition,
    InvariantSeverity, InvariantViolationRecord, LoopSummary, PlanSelection, TrustStateIndex,
};
use crate::audit::{AuditStore, LogName};
use crate::config::DefaultContextConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::Display;

/// Where a piece of governance state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContextSource {
    /// Recorded for this loop.
    Loop,
    /// The tracker's latest global reading.
    Current,
    /// Nothing recorded; configured defaults.
    Default,
}

/// Snapshot of the governance state a plan decision was made under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceContext {
    pub loop_id: String,
    pub emotion_state: EmotionState,
    pub emotion_source: ContextSource,
    pub trust_score: f64,
    pub trust_source: ContextSource,
    pub critical_invariant_violations: u32,
    pub non_critical_invariant_violations: u32,
    pub violated_invariants: Vec<String>,
}

/// Read-only view over the collaborator inputs in the audit store.
#[derive(Debug, Clone)]
pub struct ContextReader {
    store: Arc<AuditStore>,
    defaults: DefaultContextConfig,
}

impl ContextReader {
    pub fn new(store: Arc<AuditStore>, defaults: DefaultContextConfig) -> Self {
        Self { store, defaults }
    }

    pub fn store(&self) -> &Arc<AuditStore> {
        &self.store
    }

    /// The most recently written selection for `loop_id`.
    pub fn latest_selection(&self, loop_id: &str) -> Option<PlanSelection> {
        self.store
            .read_log::<PlanSelection>(LogName::PlanSelections)
            .into_iter()
            .rev()
            .find(|s| s.loop_id == loop_id)
    }

    pub fn comparison_set(&self, loop_id: &str, comparison_set_id: &str) -> Option<ComparisonSet> {
        self.store
            .read_log::<ComparisonSet>(LogName::ComparisonSets)
            .into_iter()
            .rev()
            .find(|c| c.loop_id == loop_id && c.comparison_set_id == comparison_set_id)
    }

    /// Comparison set behind the latest selection, or the latest set recorded
    /// for the loop when nothing has been selected yet.
    pub fn latest_comparison_set(&self, loop_id: &str) -> Option<ComparisonSet> {
        if let Some(selection) = self.latest_selection(loop_id) {
            return self.comparison_set(loop_id, &selection.comparison_set_id);
        }
        self.store
            .read_log::<ComparisonSet>(LogName::ComparisonSets)
            .into_iter()
            .rev()
            .find(|c| c.loop_id == loop_id)
    }

    pub fn invariant_catalogue(&self) -> Vec<InvariantDefinition> {
        self.store.read_log(LogName::InvariantCatalogue)
    }

    pub fn beliefs(&self) -> Vec<BeliefWeight> {
        self.store.read_log(LogName::BeliefWeights)
    }

    pub fn loop_summaries(&self) -> Vec<LoopSummary> {
        self.store.read_log(LogName::LoopSummaries)
    }

    pub fn summary_for(&self, loop_id: &str) -> Option<LoopSummary> {
        self.loop_summaries()
            .into_iter()
            .rev()
            .find(|s| s.loop_id == loop_id)
    }

    /// Governance context for a loop, optionally narrowed to one plan's
    /// invariant violations.
    pub fn context_for(&self, loop_id: &str, plan_id: Option<&str>) -> GovernanceContext {
        let (emotion_state, emotion_source) = self.emotion_for(loop_id);
        let (trust_score, trust_source) = self.trust_for(loop_id);

        let catalogue = self.invariant_catalogue();
        let mut critical = 0;
        let mut non_critical = 0;
        let mut violated_invariants = Vec::new();

        let records = self
            .store
            .read_log::<InvariantViolationRecord>(LogName::InvariantViolations);
        for record in records.iter().filter(|r| r.loop_id == loop_id) {
            let applies = match (&record.plan_id, plan_id) {
                (None, _) => true,
                (Some(recorded), Some(wanted)) => recorded == wanted,
                (Some(_), None) => true,
            };
            if !applies {
                continue;
            }

            let severity = record.severity.unwrap_or_else(|| {
                catalogue
                    .iter()
                    .find(|d| d.id == record.invariant_id)
                    .map(|d| d.severity)
                    .unwrap_or_default()
            });
            match severity {
                InvariantSeverity::Critical => critical += 1,
                InvariantSeverity::NonCritical => non_critical += 1,
            }
            violated_invariants.push(record.invariant_id.clone());
        }

        GovernanceContext {
            loop_id: loop_id.to_string(),
            emotion_state,
            emotion_source,
            trust_score,
            trust_source,
            critical_invariant_violations: critical,
            non_critical_invariant_violations: non_critical,
            violated_invariants,
        }
    }

    fn emotion_for(&self, loop_id: &str) -> (EmotionState, ContextSource) {
        let mut index: EmotionStateIndex = self.store.read_document(LogName::EmotionState);
        if let Some(state) = index.loops.remove(loop_id) {
            return (state, ContextSource::Loop);
        }
        if let Some(state) = index.current {
            return (state, ContextSource::Current);
        }
        tracing::debug!(loop_id, "no emotion state recorded; using defaults");
        (
            EmotionState {
                valence: self.defaults.valence,
                arousal: self.defaults.arousal,
                positive_valence: None,
                dominant_emotion: None,
            },
            ContextSource::Default,
        )
    }

    fn trust_for(&self, loop_id: &str) -> (f64, ContextSource) {
        let index: TrustStateIndex = self.store.read_document(LogName::TrustState);
        if let Some(score) = index.loops.get(loop_id) {
            return (*score, ContextSource::Loop);
        }
        if let Some(score) = index.current {
            return (score, ContextSource::Current);
        }
        tracing::debug!(loop_id, "no trust state recorded; using defaults");
        (self.defaults.trust_score, ContextSource::Default)
    }
}
