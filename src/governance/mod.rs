//! Governance inputs produced by collaborators outside this crate (planner,
//! emotion/trust trackers, invariant checkers) and the per-loop context
//! assembled from them.

mod context;
mod inputs;

pub use context::{ContextReader, ContextSource, GovernanceContext};
pub use inputs::{
    BeliefWeight, CandidatePlanSummary, ComparisonSet, EmotionState, EmotionStateIndex,
    InvariantDefinition, InvariantSeverity, InvariantViolationRecord, LoopSummary, PlanSelection,
    TrustStateIndex,
};
