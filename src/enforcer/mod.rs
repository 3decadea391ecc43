//! Per-agent permission and resource enforcement.
//!
//! Every `check_*` answers with a plain boolean. The reason for a denial is
//! only recorded in the violation log, together with the action the caller
//! is expected to take.

mod profile;
mod trackers;
mod types;

pub use profile::{AgentProfile, PermissionOverride, Permissions};
pub use trackers::AgentRuntimeState;
pub use types::{ConfidenceVerdict, Violation, ViolationKind, ViolationResponse};

use crate::audit::{AuditStore, LogName};
use crate::clock::Clock;
use crate::config::EnforcerConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Owns the profile cache and the runtime counters of every agent.
///
/// Two independent locks: `profiles` and `runtime`. No method holds both at
/// once.
pub struct Enforcer {
    config: EnforcerConfig,
    store: Arc<AuditStore>,
    clock: Arc<dyn Clock>,
    profiles: Mutex<HashMap<String, Arc<AgentProfile>>>,
    runtime: Mutex<HashMap<String, AgentRuntimeState>>,
}

impl std::fmt::Debug for Enforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enforcer")
            .field("violation_threshold", &self.config.violation_threshold)
            .finish_non_exhaustive()
    }
}

impl Enforcer {
    pub fn new(config: EnforcerConfig, store: Arc<AuditStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store,
            clock,
            profiles: Mutex::new(HashMap::new()),
            runtime: Mutex::new(HashMap::new()),
        }
    }

    /// Effective profile for `agent`, resolved once and cached.
    ///
    /// An override that widens the base profile without `elevated` is
    /// discarded: the agent runs on the base profile and a
    /// `config_elevation` violation is recorded.
    pub fn profile(&self, agent: &str) -> Arc<AgentProfile> {
        if let Some(cached) = self
            .profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(agent)
        {
            return Arc::clone(cached);
        }

        let base = &self.config.base_profile;
        let permissions = match self.config.agents.get(agent) {
            None => base.clone(),
            Some(over) => match base.apply_override(agent, over) {
                Ok(narrowed) => narrowed,
                Err(error) => {
                    tracing::warn!(agent, %error, "rejecting profile override; using base profile");
                    self.record_violation(agent, ViolationKind::ConfigElevation, error.to_string());
                    base.clone()
                }
            },
        };

        let profile = Arc::new(AgentProfile::new(agent, permissions));
        let mut profiles = self.profiles.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(profiles.entry(agent.to_string()).or_insert(profile))
    }

    /// Start the lifecycle clock. Re-registering keeps the original start.
    pub fn register_agent_start(&self, agent: &str) {
        let now = self.clock.now();
        let mut runtime = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        if runtime.contains_key(agent) {
            tracing::debug!(agent, "agent already registered; keeping original start time");
            return;
        }
        runtime.insert(agent.to_string(), AgentRuntimeState::new(now));
        tracing::info!(agent, "agent registered");
    }

    pub fn check_lifecycle(&self, agent: &str) -> bool {
        let max_run_time_sec = self.profile(agent).permissions.max_run_time_sec;
        let now = self.clock.now();
        let allowed = self.with_state(agent, |state| state.lifecycle_ok(now, max_run_time_sec));
        if !allowed {
            self.record_violation(
                agent,
                ViolationKind::Lifecycle,
                format!("runtime exceeded {max_run_time_sec}s"),
            );
        }
        allowed
    }

    pub fn check_rate_limit(&self, agent: &str) -> bool {
        let limit = self.profile(agent).permissions.rate_limit_per_minute;
        let now = self.clock.now();
        let allowed = self.with_state(agent, |state| state.record_action(now, limit));
        if !allowed {
            self.record_violation(
                agent,
                ViolationKind::RateLimit,
                format!("more than {limit} actions within one minute"),
            );
        }
        allowed
    }

    pub fn check_retry_limit(&self, agent: &str, action_id: &str) -> bool {
        let max_retries = self.profile(agent).permissions.max_retries;
        let (count, allowed) =
            self.with_state(agent, |state| state.record_retry(action_id, max_retries));
        if !allowed {
            self.record_violation(
                agent,
                ViolationKind::RetryLimit,
                format!("action {action_id} retried {count} times (max {max_retries})"),
            );
        }
        allowed
    }

    /// Forget the retry budget spent on `action_id`, e.g. after it succeeded.
    pub fn reset_retries(&self, agent: &str, action_id: &str) {
        self.with_state(agent, |state| state.clear_retries(action_id));
    }

    pub fn check_tool_permission(&self, agent: &str, tool: &str) -> bool {
        let allowed = self
            .profile(agent)
            .permissions
            .allowed_tools
            .iter()
            .any(|t| t == tool);
        if !allowed {
            self.record_violation(
                agent,
                ViolationKind::UnauthorizedTool,
                format!("tool {tool} is not in the agent's allow list"),
            );
        }
        allowed
    }

    pub fn check_code_execution(&self, agent: &str) -> bool {
        let allowed = self.profile(agent).permissions.allow_code_execution;
        if !allowed {
            self.record_violation(
                agent,
                ViolationKind::CodeExecution,
                "code execution not permitted".to_string(),
            );
        }
        allowed
    }

    pub fn check_memory_access(&self, agent: &str, scope: &str, is_write: bool) -> bool {
        let profile = self.profile(agent);
        let permissions = &profile.permissions;
        if !permissions.memory_scopes.iter().any(|s| s == scope) {
            self.record_violation(
                agent,
                ViolationKind::MemoryScope,
                format!("memory scope {scope} not permitted"),
            );
            return false;
        }
        if is_write && !permissions.can_write_memory {
            self.record_violation(
                agent,
                ViolationKind::MemoryWrite,
                format!("write to memory scope {scope} not permitted"),
            );
            return false;
        }
        true
    }

    pub fn check_confidence(&self, agent: &str, confidence: f64) -> ConfidenceVerdict {
        let threshold = self.profile(agent).permissions.confidence_escalation_threshold;
        if confidence.is_nan() || confidence < threshold {
            let reason = format!("confidence {confidence:.2} below threshold {threshold:.2}");
            self.record_violation(agent, ViolationKind::LowConfidence, reason.clone());
            return ConfidenceVerdict {
                escalate: true,
                reason,
            };
        }
        ConfidenceVerdict {
            escalate: false,
            reason: format!("confidence {confidence:.2} meets threshold {threshold:.2}"),
        }
    }

    /// Count one more violation for `agent` and decide the recommended action.
    /// Once the running count reaches the configured threshold the severe
    /// action replaces the soft one.
    pub fn handle_violation(&self, agent: &str, kind: ViolationKind) -> ViolationResponse {
        let count = self.with_state(agent, |state| {
            state.violation_count += 1;
            state.violation_count
        });

        let threshold_exceeded = count >= self.config.violation_threshold;
        let action = if threshold_exceeded {
            self.config.severe_action.clone()
        } else if kind == ViolationKind::LowConfidence {
            "escalate".to_string()
        } else {
            self.config.soft_action.clone()
        };

        ViolationResponse {
            message: format!("{agent}: {kind} violation #{count}; recommended action: {action}"),
            action,
            violation_count: count,
            threshold_exceeded,
        }
    }

    pub fn runtime_snapshot(&self, agent: &str) -> Option<AgentRuntimeState> {
        self.runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(agent)
            .cloned()
    }

    /// Violations recorded for `agent`, oldest first.
    pub fn violations(&self, agent: &str) -> Vec<Violation> {
        self.store
            .read_log::<Violation>(LogName::Violations)
            .into_iter()
            .filter(|v| v.agent_name == agent)
            .collect()
    }

    fn with_state<R>(&self, agent: &str, f: impl FnOnce(&mut AgentRuntimeState) -> R) -> R {
        let now = self.clock.now();
        let mut runtime = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        let state = runtime
            .entry(agent.to_string())
            .or_insert_with(|| AgentRuntimeState::new(now));
        f(state)
    }

    fn record_violation(&self, agent: &str, kind: ViolationKind, details: String) {
        let response = self.handle_violation(agent, kind);
        tracing::warn!(
            agent,
            violation = %kind,
            count = response.violation_count,
            action = %response.action,
            "{details}"
        );

        let violation = Violation {
            timestamp: self.clock.now(),
            agent_name: agent.to_string(),
            violation_type: kind,
            violation_reason: kind.reason_code().to_string(),
            details,
            violation_count: response.violation_count,
            severe_action: response
                .threshold_exceeded
                .then(|| self.config.severe_action.clone()),
            recommended_action: response.action,
            threshold_exceeded: response.threshold_exceeded,
        };
        if let Err(error) = self.store.append(LogName::Violations, &violation) {
            tracing::warn!(agent, %error, "failed to persist violation");
        }
    }
}
