//! Plan admission control: per-plan rejection against emotion, trust and
//! invariant thresholds, and escalation once every candidate of a
//! comparison set has been rejected.

mod escalation;
mod rejector;
mod types;

pub use escalation::EscalationDetector;
pub use rejector::{PlanRejector, rejection_triggers};
pub use types::{
    Condition, EscalationAction, EscalationRecord, FallbackPolicy, GovernanceSummary,
    PlanEvaluation, RejectionRecord, RejectionTrigger, ThresholdDetails,
};
