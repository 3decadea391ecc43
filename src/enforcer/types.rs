use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViolationKind {
    RateLimit,
    Lifecycle,
    RetryLimit,
    UnauthorizedTool,
    CodeExecution,
    MemoryScope,
    MemoryWrite,
    LowConfidence,
    ConfigElevation,
}

impl ViolationKind {
    pub fn reason_code(self) -> &'static str {
        match self {
            Self::RateLimit => "rate_limit_exceeded",
            Self::Lifecycle => "lifecycle_exceeded",
            Self::RetryLimit => "retry_limit_exceeded",
            Self::UnauthorizedTool => "tool_not_permitted",
            Self::CodeExecution => "code_execution_denied",
            Self::MemoryScope => "memory_scope_not_permitted",
            Self::MemoryWrite => "memory_write_denied",
            Self::LowConfidence => "confidence_below_threshold",
            Self::ConfigElevation => "override_widens_permissions",
        }
    }
}

/// One entry of the violation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub timestamp: DateTime<Utc>,
    pub agent_name: String,
    pub violation_type: ViolationKind,
    pub violation_reason: String,
    pub details: String,
    pub violation_count: u32,
    pub recommended_action: String,
    pub threshold_exceeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severe_action: Option<String>,
}

/// What the caller should do about an agent after its latest violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationResponse {
    pub action: String,
    pub message: String,
    pub violation_count: u32,
    pub threshold_exceeded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceVerdict {
    pub escalate: bool,
    pub reason: String,
}
