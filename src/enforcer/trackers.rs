use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

const RATE_WINDOW_SECS: i64 = 60;

/// Per-agent counters for the current process. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRuntimeState {
    pub start_time: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_count: u32,
    pub total_actions: u64,
    pub retries: HashMap<String, u32>,
    pub violation_count: u32,
    /// Latched once the lifecycle budget is spent.
    pub lifecycle_expired: bool,
}

impl AgentRuntimeState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            start_time: now,
            window_start: now,
            window_count: 0,
            total_actions: 0,
            retries: HashMap::new(),
            violation_count: 0,
            lifecycle_expired: false,
        }
    }

    /// Count an action against a fixed one-minute window. The window resets
    /// only once strictly more than 60 seconds have passed since it opened.
    /// Denied actions are not counted.
    pub fn record_action(&mut self, now: DateTime<Utc>, limit_per_minute: u32) -> bool {
        if now - self.window_start > Duration::seconds(RATE_WINDOW_SECS) {
            self.window_start = now;
            self.window_count = 0;
        }
        if self.window_count >= limit_per_minute {
            return false;
        }
        self.window_count += 1;
        self.total_actions += 1;
        true
    }

    /// Bump the retry counter for `action_id`; allowed while within `max_retries`.
    pub fn record_retry(&mut self, action_id: &str, max_retries: u32) -> (u32, bool) {
        let count = self.retries.entry(action_id.to_string()).or_insert(0);
        *count += 1;
        (*count, *count <= max_retries)
    }

    pub fn clear_retries(&mut self, action_id: &str) {
        self.retries.remove(action_id);
    }

    /// Latching lifecycle check. A budget too large to represent never expires.
    pub fn lifecycle_ok(&mut self, now: DateTime<Utc>, max_run_time_sec: u64) -> bool {
        if self.lifecycle_expired {
            return false;
        }
        let Some(budget) = i64::try_from(max_run_time_sec)
            .ok()
            .and_then(Duration::try_seconds)
        else {
            return true;
        };
        if now - self.start_time > budget {
            self.lifecycle_expired = true;
            return false;
        }
        true
    }
}
