use crate::audit::{AuditStore, LogName};
use crate::clock::{Clock, system_clock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

pub const AGENT_SEQUENCE: [&str; 6] = ["core-forge", "hal", "nova", "critic", "sage", "memory"];
pub const LOOP_START_AGENT: &str = "core-forge";
pub const LOOP_END_AGENT: &str = "memory";

/// Successor of `agent` in the loop sequence; `None` for agents outside it.
/// The last agent wraps back to the first.
pub fn next_in_sequence(agent: &str) -> Option<&'static str> {
    let index = AGENT_SEQUENCE.iter().position(|a| *a == agent)?;
    Some(AGENT_SEQUENCE[(index + 1) % AGENT_SEQUENCE.len()])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopDecision {
    pub project_id: String,
    pub loop_count: u32,
    pub last_agent: Option<String>,
    pub next_agent: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextAgent {
    pub agent: String,
    pub reason: String,
    /// The current loop is over and the next agent opens a new one.
    pub starts_new_loop: bool,
    /// The last agent was not in the sequence; the loop restarts.
    pub forced_restart: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSnapshot {
    pub project_id: String,
    pub loop_count: u32,
    pub completed_agents: Vec<String>,
    pub loop_complete: bool,
    pub last_agent: Option<String>,
    pub decisions: usize,
}

#[derive(Debug, Clone)]
struct ProjectState {
    loop_count: u32,
    completed_agents: Vec<String>,
    loop_complete: bool,
    last_agent: Option<String>,
    decisions: Vec<LoopDecision>,
}

impl ProjectState {
    fn new() -> Self {
        Self {
            loop_count: 1,
            completed_agents: Vec::new(),
            loop_complete: false,
            last_agent: None,
            decisions: Vec::new(),
        }
    }

    fn start_next_loop(&mut self) {
        self.loop_count += 1;
        self.completed_agents.clear();
        self.loop_complete = false;
        self.last_agent = None;
    }

    fn restart_current_loop(&mut self) {
        self.completed_agents.clear();
        self.loop_complete = false;
        self.last_agent = None;
    }

    fn snapshot(&self, project_id: &str) -> ProjectSnapshot {
        ProjectSnapshot {
            project_id: project_id.to_string(),
            loop_count: self.loop_count,
            completed_agents: self.completed_agents.clone(),
            loop_complete: self.loop_complete,
            last_agent: self.last_agent.clone(),
            decisions: self.decisions.len(),
        }
    }

    fn next_agent(&self, project_id: &str) -> NextAgent {
        match self.last_agent.as_deref() {
            None => NextAgent {
                agent: LOOP_START_AGENT.to_string(),
                reason: format!("loop {} starts with {LOOP_START_AGENT}", self.loop_count),
                starts_new_loop: false,
                forced_restart: false,
            },
            Some(last) if self.loop_complete || last == LOOP_END_AGENT => NextAgent {
                agent: LOOP_START_AGENT.to_string(),
                reason: format!(
                    "loop {} complete after {last}; loop {} restarts at {LOOP_START_AGENT}",
                    self.loop_count,
                    self.loop_count + 1
                ),
                starts_new_loop: true,
                forced_restart: false,
            },
            Some(last) => match next_in_sequence(last) {
                Some(next) => NextAgent {
                    agent: next.to_string(),
                    reason: format!("{last} completed; {next} follows in sequence"),
                    starts_new_loop: false,
                    forced_restart: false,
                },
                None => {
                    warn!(
                        project_id,
                        last_agent = last,
                        "unknown last agent; forcing restart at {LOOP_START_AGENT}"
                    );
                    NextAgent {
                        agent: LOOP_START_AGENT.to_string(),
                        reason: format!(
                            "recovery: unknown last agent {last:?}; loop {} restarts at {LOOP_START_AGENT}",
                            self.loop_count
                        ),
                        starts_new_loop: false,
                        forced_restart: true,
                    }
                }
            },
        }
    }
}

/// Owns per-project loop state. One instance per control plane.
pub struct Scheduler {
    store: Arc<AuditStore>,
    clock: Arc<dyn Clock>,
    projects: Mutex<HashMap<String, ProjectState>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let projects = self
            .projects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f.debug_struct("Scheduler")
            .field("projects", &projects.len())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(store: Arc<AuditStore>) -> Self {
        Self {
            store,
            clock: system_clock(),
            projects: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn with_project<R>(&self, project_id: &str, f: impl FnOnce(&mut ProjectState) -> R) -> R {
        let mut projects = self
            .projects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let state = projects
            .entry(project_id.to_string())
            .or_insert_with(ProjectState::new);
        f(state)
    }

    /// Create the project on first reference; a completed loop is reset and
    /// the loop counter advances.
    pub fn initialize(&self, project_id: &str) -> ProjectSnapshot {
        self.with_project(project_id, |state| {
            if state.loop_complete {
                state.start_next_loop();
                info!(project_id, loop_count = state.loop_count, "new loop initialized");
            }
            state.snapshot(project_id)
        })
    }

    pub fn complete_agent(&self, project_id: &str, agent: &str) -> ProjectSnapshot {
        self.with_project(project_id, |state| {
            if !state.completed_agents.iter().any(|a| a == agent) {
                state.completed_agents.push(agent.to_string());
            }
            state.last_agent = Some(agent.to_string());
            if agent == LOOP_END_AGENT
                || AGENT_SEQUENCE
                    .iter()
                    .all(|required| state.completed_agents.iter().any(|a| a == required))
            {
                state.loop_complete = true;
                info!(project_id, loop_count = state.loop_count, "loop complete");
            }
            debug!(project_id, agent, "agent completed");
            state.snapshot(project_id)
        })
    }

    /// Next agent from the last completed one. Nothing is recorded.
    pub fn determine_next_agent(&self, project_id: &str) -> NextAgent {
        self.with_project(project_id, |state| state.next_agent(project_id))
    }

    /// Advance the project to its next agent and record the decision.
    pub fn trigger_next_agent(&self, project_id: &str) -> LoopDecision {
        let now = self.clock.now();
        let decision = self.with_project(project_id, |state| {
            let next = state.next_agent(project_id);
            let last_agent = state.last_agent.clone();
            if next.starts_new_loop {
                state.start_next_loop();
            } else if next.forced_restart {
                state.restart_current_loop();
            }
            let decision = LoopDecision {
                project_id: project_id.to_string(),
                loop_count: state.loop_count,
                last_agent,
                next_agent: next.agent,
                reason: next.reason,
                timestamp: now,
            };
            state.decisions.push(decision.clone());
            decision
        });

        info!(
            project_id,
            loop_count = decision.loop_count,
            next_agent = %decision.next_agent,
            "next agent triggered"
        );
        if let Err(error) = self.store.append(LogName::LoopDecisions, &decision) {
            warn!(project_id, %error, "failed to mirror loop decision to audit log");
        }
        decision
    }

    pub fn get_decisions(&self, project_id: &str) -> Vec<LoopDecision> {
        self.with_project(project_id, |state| state.decisions.clone())
    }

    pub fn get_last_decision(&self, project_id: &str) -> Option<LoopDecision> {
        self.with_project(project_id, |state| state.decisions.last().cloned())
    }

    pub fn snapshot(&self, project_id: &str) -> ProjectSnapshot {
        self.with_project(project_id, |state| state.snapshot(project_id))
    }
}
