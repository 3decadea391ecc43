use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Every named log or input document the control plane reads or writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogName {
    // Outputs
    Violations,
    PlanRejections,
    PlanEscalations,
    GovernanceAlignment,
    DebuggerReports,
    HistorianAlerts,
    SevereDriftWarnings,
    LoopDecisions,

    // Inputs produced by collaborators
    PlanSelections,
    ComparisonSets,
    EmotionState,
    TrustState,
    InvariantCatalogue,
    InvariantViolations,
    BeliefWeights,
    LoopSummaries,
}

impl LogName {
    pub fn file_name(self) -> String {
        format!("{self}.json")
    }

    /// Logs the control plane appends to (as opposed to inputs it only reads).
    pub fn is_output(self) -> bool {
        matches!(
            self,
            Self::Violations
                | Self::PlanRejections
                | Self::PlanEscalations
                | Self::GovernanceAlignment
                | Self::DebuggerReports
                | Self::HistorianAlerts
                | Self::SevereDriftWarnings
                | Self::LoopDecisions
        )
    }
}
