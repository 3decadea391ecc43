use crate::enforcer::{PermissionOverride, Permissions};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcerConfig {
    /// Violations per agent before the recommended action turns severe.
    #[serde(default = "default_violation_threshold")]
    pub violation_threshold: u32,
    #[serde(default = "default_soft_action")]
    pub soft_action: String,
    #[serde(default = "default_severe_action")]
    pub severe_action: String,
    #[serde(default)]
    pub base_profile: Permissions,
    /// Per-agent narrowing of `base_profile`.
    #[serde(default)]
    pub agents: BTreeMap<String, PermissionOverride>,
}

/// Upper bound for any lifecycle budget: one hundred years.
pub const MAX_RUN_TIME_SEC: u64 = 100 * 365 * 24 * 60 * 60;

fn default_violation_threshold() -> u32 {
    3
}

fn default_soft_action() -> String {
    "block".into()
}

fn default_severe_action() -> String {
    "terminate".into()
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self {
            violation_threshold: default_violation_threshold(),
            soft_action: default_soft_action(),
            severe_action: default_severe_action(),
            base_profile: Permissions::default(),
            agents: BTreeMap::new(),
        }
    }
}

impl EnforcerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.violation_threshold == 0 {
            anyhow::bail!("enforcer.violation_threshold must be >= 1");
        }
        if self.soft_action.trim().is_empty() || self.severe_action.trim().is_empty() {
            anyhow::bail!("enforcer.soft_action and enforcer.severe_action must not be empty");
        }
        let threshold = self.base_profile.confidence_escalation_threshold;
        if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("enforcer.base_profile.confidence_escalation_threshold must be in [0.0, 1.0]");
        }
        if self.base_profile.max_run_time_sec > MAX_RUN_TIME_SEC {
            anyhow::bail!("enforcer.base_profile.max_run_time_sec must be <= {MAX_RUN_TIME_SEC}");
        }
        for (agent, over) in &self.agents {
            if over.max_run_time_sec.is_some_and(|secs| secs > MAX_RUN_TIME_SEC) {
                anyhow::bail!("enforcer.agents.{agent}.max_run_time_sec must be <= {MAX_RUN_TIME_SEC}");
            }
        }
        Ok(())
    }
}
