use super::classifier::{FailureKind, RootCause};
use serde::{Deserialize, Serialize};

/// Ordered remediation checklist for one failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchPlan {
    pub steps: Vec<String>,
    pub next_agent: String,
    pub confidence: f64,
    pub suggested_fix: String,
}

/// Agent responsible for recovering from a failure kind.
pub fn map_failure_to_agent(kind: &FailureKind) -> &'static str {
    match kind {
        FailureKind::Timeout | FailureKind::Memory => "optimizer",
        FailureKind::RateLimit => "scheduler",
        FailureKind::Permission => "security",
        FailureKind::NotFound => "researcher",
        FailureKind::InvalidInput => "validator",
        FailureKind::Network => "connector",
        FailureKind::Dependency => "installer",
        FailureKind::Unknown | FailureKind::Other(_) => "critic",
    }
}

fn remediation_steps(kind: &FailureKind) -> &'static [&'static str] {
    match kind {
        FailureKind::Timeout => &[
            "Identify the operation that exceeded its time budget",
            "Raise the timeout or split the operation into smaller units",
            "Add progress checkpoints so partial work survives a retry",
            "Re-run the loop step",
        ],
        FailureKind::RateLimit => &[
            "Pause calls to the throttled service",
            "Retry with exponential backoff",
            "Spread requests across the rate-limit window",
            "Re-run the loop step",
        ],
        FailureKind::Permission => &[
            "Confirm which tool or memory scope was denied",
            "Check the agent profile and credentials",
            "Request elevation from an operator if the access is required",
            "Re-run the loop step with corrected permissions",
        ],
        FailureKind::NotFound => &[
            "Locate the missing resource or identifier",
            "Correct the reference or recreate the resource",
            "Re-run the loop step",
        ],
        FailureKind::InvalidInput => &[
            "Capture the offending input",
            "Validate it against the expected schema",
            "Sanitize or regenerate the input",
            "Re-run the loop step",
        ],
        FailureKind::Memory => &[
            "Measure memory use of the failing step",
            "Reduce batch size or context window",
            "Release cached data before retrying",
            "Re-run the loop step",
        ],
        FailureKind::Network => &[
            "Check connectivity to the remote endpoint",
            "Verify DNS and proxy settings",
            "Retry once the endpoint is reachable",
        ],
        FailureKind::Dependency => &[
            "Identify the missing or incompatible package",
            "Install or pin the required version",
            "Re-run the loop step",
        ],
        FailureKind::Unknown | FailureKind::Other(_) => &[
            "Review the full failure evidence",
            "Reproduce the failure in isolation",
            "Escalate to the critic for manual analysis",
        ],
    }
}

pub fn build_patch_plan(root_cause: &RootCause) -> PatchPlan {
    PatchPlan {
        steps: remediation_steps(&root_cause.failure_type)
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        next_agent: map_failure_to_agent(&root_cause.failure_type).to_string(),
        confidence: root_cause.confidence,
        suggested_fix: root_cause.suggested_fix.clone(),
    }
}
