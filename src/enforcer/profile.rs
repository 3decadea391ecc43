use crate::error::ProfileError;
use serde::{Deserialize, Serialize};

/// Effective limits and grants for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    #[serde(alias = "tools")]
    pub allowed_tools: Vec<String>,
    pub memory_scopes: Vec<String>,
    pub can_write_memory: bool,
    pub allow_code_execution: bool,
    pub github_commit: bool,
    pub max_retries: u32,
    pub rate_limit_per_minute: u32,
    /// Confidence below this escalates to an operator.
    pub confidence_escalation_threshold: f64,
    pub max_run_time_sec: u64,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            allowed_tools: vec![
                "web_search".into(),
                "memory_read".into(),
                "memory_write".into(),
                "summarize".into(),
                "code_interpreter".into(),
            ],
            memory_scopes: vec!["loop".into(), "project".into()],
            can_write_memory: true,
            allow_code_execution: false,
            github_commit: false,
            max_retries: 3,
            rate_limit_per_minute: 30,
            confidence_escalation_threshold: 0.6,
            max_run_time_sec: 600,
        }
    }
}

/// Per-agent narrowing of the base permissions. Absent fields inherit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionOverride {
    #[serde(default, alias = "tools", skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_write_memory: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_code_execution: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_commit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_minute: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_escalation_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_run_time_sec: Option<u64>,
    /// Allows the override to widen the base permissions.
    #[serde(default)]
    pub elevated: bool,
}

/// An agent's resolved profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub agent_id: String,
    #[serde(flatten)]
    pub permissions: Permissions,
}

impl AgentProfile {
    pub fn new(agent_id: impl Into<String>, permissions: Permissions) -> Self {
        Self {
            agent_id: agent_id.into(),
            permissions,
        }
    }
}

impl Permissions {
    /// Apply `over` field by field. Without `elevated`, every field may only
    /// keep or tighten the base value: lists may drop members, flags may go
    /// true→false, limits may shrink, the escalation threshold may rise.
    pub fn apply_override(
        &self,
        agent: &str,
        over: &PermissionOverride,
    ) -> Result<Self, ProfileError> {
        let guard = Narrowing {
            agent,
            elevated: over.elevated,
        };

        Ok(Self {
            allowed_tools: guard.list("allowed_tools", &self.allowed_tools, over.allowed_tools.as_ref())?,
            memory_scopes: guard.list("memory_scopes", &self.memory_scopes, over.memory_scopes.as_ref())?,
            can_write_memory: guard.flag("can_write_memory", self.can_write_memory, over.can_write_memory)?,
            allow_code_execution: guard.flag(
                "allow_code_execution",
                self.allow_code_execution,
                over.allow_code_execution,
            )?,
            github_commit: guard.flag("github_commit", self.github_commit, over.github_commit)?,
            max_retries: guard.ceiling("max_retries", self.max_retries, over.max_retries)?,
            rate_limit_per_minute: guard.ceiling(
                "rate_limit_per_minute",
                self.rate_limit_per_minute,
                over.rate_limit_per_minute,
            )?,
            confidence_escalation_threshold: guard.floor(
                "confidence_escalation_threshold",
                self.confidence_escalation_threshold,
                over.confidence_escalation_threshold,
            )?,
            max_run_time_sec: guard.ceiling("max_run_time_sec", self.max_run_time_sec, over.max_run_time_sec)?,
        })
    }
}

struct Narrowing<'a> {
    agent: &'a str,
    elevated: bool,
}

impl Narrowing<'_> {
    fn widened(&self, field: &str) -> ProfileError {
        ProfileError::Elevation {
            agent: self.agent.to_string(),
            field: field.to_string(),
        }
    }

    fn list(
        &self,
        field: &str,
        base: &[String],
        over: Option<&Vec<String>>,
    ) -> Result<Vec<String>, ProfileError> {
        let Some(over) = over else {
            return Ok(base.to_vec());
        };
        if !self.elevated && over.iter().any(|item| !base.contains(item)) {
            return Err(self.widened(field));
        }
        Ok(over.clone())
    }

    fn flag(&self, field: &str, base: bool, over: Option<bool>) -> Result<bool, ProfileError> {
        match over {
            Some(true) if !base && !self.elevated => Err(self.widened(field)),
            Some(value) => Ok(value),
            None => Ok(base),
        }
    }

    /// Upper limits: larger is wider.
    fn ceiling<T: PartialOrd + Copy>(
        &self,
        field: &str,
        base: T,
        over: Option<T>,
    ) -> Result<T, ProfileError> {
        match over {
            Some(value) if value > base && !self.elevated => Err(self.widened(field)),
            Some(value) => Ok(value),
            None => Ok(base),
        }
    }

    /// Lower bounds: smaller is wider.
    fn floor(&self, field: &str, base: f64, over: Option<f64>) -> Result<f64, ProfileError> {
        match over {
            Some(value) if value < base && !self.elevated => Err(self.widened(field)),
            Some(value) => Ok(value),
            None => Ok(base),
        }
    }
}
