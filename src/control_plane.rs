//! One long-lived service instance wiring every governance stage together.

use crate::admission::{EscalationDetector, EscalationRecord, PlanRejector, RejectionRecord};
use crate::audit::{AuditStore, LogName};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::debugger::{Debugger, DebuggerReport};
use crate::enforcer::{ConfidenceVerdict, Enforcer};
use crate::error::GovResult;
use crate::governance::ContextReader;
use crate::historian::{DriftOutcome, Historian};
use crate::orchestrator::{LoopDecision, Scheduler};
use crate::reconciler::Reconciler;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryAccess {
    pub scope: String,
    #[serde(default)]
    pub write: bool,
}

/// What one agent did during a loop cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleInput {
    pub project_id: String,
    pub loop_id: String,
    pub agent: String,
    #[serde(default)]
    pub action_id: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub memory: Vec<MemoryAccess>,
    #[serde(default)]
    pub code_execution: bool,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// A plan was selected this cycle; run admission control on it.
    #[serde(default)]
    pub plan_selected: bool,
    /// Evaluate every candidate of the comparison set, not just the selection.
    #[serde(default)]
    pub evaluate_all_candidates: bool,
    #[serde(default)]
    pub failure_evidence: Option<String>,
    #[serde(default)]
    pub loop_context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub project_id: String,
    pub loop_id: String,
    pub agent: String,
    /// Gates that denied the action, in evaluation order.
    pub denied: Vec<String>,
    pub recommended_action: Option<String>,
    pub confidence: Option<ConfidenceVerdict>,
    pub rejections: Vec<RejectionRecord>,
    pub escalation: Option<EscalationRecord>,
    pub debugger_report: Option<DebuggerReport>,
    pub drift: Option<DriftOutcome>,
    pub next: Option<LoopDecision>,
}

impl CycleReport {
    pub fn allowed(&self) -> bool {
        self.denied.is_empty()
    }
}

pub struct ControlPlane {
    config: Config,
    store: Arc<AuditStore>,
    enforcer: Enforcer,
    rejector: PlanRejector,
    escalation: EscalationDetector,
    debugger: Debugger,
    historian: Historian,
    reconciler: Reconciler,
    scheduler: Scheduler,
}

impl std::fmt::Debug for ControlPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPlane")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ControlPlane {
    /// Control plane over the file store at the configured audit directory.
    pub fn open(config: Config) -> Self {
        let store = Arc::new(AuditStore::open(&config.audit_dir_path()));
        Self::with_store(config, store, Arc::new(SystemClock))
    }

    pub fn with_store(config: Config, store: Arc<AuditStore>, clock: Arc<dyn Clock>) -> Self {
        let reader = ContextReader::new(store.clone(), config.admission.default_context);
        Self {
            enforcer: Enforcer::new(config.enforcer.clone(), store.clone(), clock.clone()),
            rejector: PlanRejector::new(reader.clone(), config.admission.clone())
                .with_clock(clock.clone()),
            escalation: EscalationDetector::new(reader.clone(), config.admission.fallback_policy)
                .with_clock(clock.clone()),
            debugger: Debugger::new(store.clone()).with_clock(clock.clone()),
            historian: Historian::new(store.clone(), config.historian.clone())
                .with_clock(clock.clone()),
            reconciler: Reconciler::new(
                reader,
                config.admission.clone(),
                config.reconciler.clone(),
            )
            .with_clock(clock.clone()),
            scheduler: Scheduler::new(store.clone()).with_clock(clock),
            store,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<AuditStore> {
        &self.store
    }

    pub fn enforcer(&self) -> &Enforcer {
        &self.enforcer
    }

    pub fn rejector(&self) -> &PlanRejector {
        &self.rejector
    }

    pub fn escalation(&self) -> &EscalationDetector {
        &self.escalation
    }

    pub fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    pub fn historian(&self) -> &Historian {
        &self.historian
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Entry count of every audit log, in declaration order.
    pub fn status(&self) -> Vec<(LogName, usize)> {
        LogName::iter()
            .map(|log| (log, self.store.entry_count(log)))
            .collect()
    }

    /// Run one agent action through every stage: enforcer gates, plan
    /// admission and escalation, failure classification, drift scan and
    /// scheduling. The drift scan runs once per loop, on the cycle that
    /// completes it, and is keyed to that loop.
    pub fn run_cycle(&self, input: &CycleInput) -> GovResult<CycleReport> {
        let agent = input.agent.as_str();
        self.enforcer.register_agent_start(agent);

        let denied = self.gate(input);
        let confidence = input
            .confidence
            .map(|c| self.enforcer.check_confidence(agent, c));

        let mut report = CycleReport {
            project_id: input.project_id.clone(),
            loop_id: input.loop_id.clone(),
            agent: input.agent.clone(),
            recommended_action: None,
            denied,
            confidence,
            rejections: Vec::new(),
            escalation: None,
            debugger_report: None,
            drift: None,
            next: None,
        };

        if !report.allowed() {
            report.recommended_action = self
                .enforcer
                .violations(agent)
                .last()
                .map(|v| v.recommended_action.clone());
            warn!(
                agent,
                loop_id = %input.loop_id,
                denied = ?report.denied,
                "cycle blocked by enforcer"
            );
            return Ok(report);
        }

        if input.plan_selected {
            report.rejections = if input.evaluate_all_candidates {
                self.rejector.evaluate_comparison_set(&input.loop_id)?
            } else {
                self.rejector
                    .process_rejection_for_loop(&input.loop_id)?
                    .into_iter()
                    .collect()
            };
            report.escalation = self.escalation.check_for_escalation(&input.loop_id)?;
        }

        match &input.failure_evidence {
            Some(evidence) => {
                report.debugger_report = Some(self.debugger.record_debugger_report(
                    &input.loop_id,
                    evidence,
                    input.loop_context.clone(),
                )?);
            }
            None => {
                if let Some(action_id) = &input.action_id {
                    self.enforcer.reset_retries(agent, action_id);
                }
                let was_complete = self.scheduler.snapshot(&input.project_id).loop_complete;
                let snapshot = self.scheduler.complete_agent(&input.project_id, agent);
                if snapshot.loop_complete && !was_complete {
                    report.drift = self.historian.scan_loop(&input.loop_id, None)?;
                }
            }
        }

        report.next = Some(self.scheduler.trigger_next_agent(&input.project_id));
        info!(
            agent,
            loop_id = %input.loop_id,
            rejections = report.rejections.len(),
            escalated = report.escalation.is_some(),
            failed = report.debugger_report.is_some(),
            "cycle complete"
        );
        Ok(report)
    }

    /// Names of the gates that denied the action. Every gate runs so each
    /// denial lands in the violation log.
    fn gate(&self, input: &CycleInput) -> Vec<String> {
        let agent = input.agent.as_str();
        let mut denied = Vec::new();

        if !self.enforcer.check_lifecycle(agent) {
            denied.push("lifecycle".to_string());
        }
        if !self.enforcer.check_rate_limit(agent) {
            denied.push("rate_limit".to_string());
        }
        if let Some(action_id) = &input.action_id
            && input.failure_evidence.is_some()
            && !self.enforcer.check_retry_limit(agent, action_id)
        {
            denied.push(format!("retry_limit:{action_id}"));
        }
        for tool in &input.tools {
            if !self.enforcer.check_tool_permission(agent, tool) {
                denied.push(format!("tool:{tool}"));
            }
        }
        if input.code_execution && !self.enforcer.check_code_execution(agent) {
            denied.push("code_execution".to_string());
        }
        for access in &input.memory {
            if !self
                .enforcer
                .check_memory_access(agent, &access.scope, access.write)
            {
                denied.push(format!("memory:{}", access.scope));
            }
        }
        denied
    }
}
