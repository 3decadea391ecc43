//! Belief-drift detection over loop narratives.

mod scoring;

pub use scoring::{belief_score, detect_forgotten_beliefs, score_alignment};

use crate::audit::{AuditStore, LogName};
use crate::clock::{Clock, system_clock};
use crate::config::HistorianConfig;
use crate::error::StoreError;
use crate::governance::{BeliefWeight, LoopSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::Display;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertKind {
    DriftDetected,
    AlignmentCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorianAlert {
    pub loop_id: String,
    pub alert_type: AlertKind,
    pub missing_beliefs: Vec<String>,
    pub loop_belief_alignment_score: f64,
    pub suggestion: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SevereDriftWarning {
    pub loop_id: String,
    pub missing_beliefs: Vec<String>,
    pub loop_belief_alignment_score: f64,
    pub threshold: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// What one alert raised: the alert, plus the severe warning when drift is bad.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftOutcome {
    pub alert: HistorianAlert,
    pub severe_warning: Option<SevereDriftWarning>,
}

#[derive(Debug, Clone)]
pub struct Historian {
    store: Arc<AuditStore>,
    config: HistorianConfig,
    clock: Arc<dyn Clock>,
}

impl Historian {
    pub fn new(store: Arc<AuditStore>, config: HistorianConfig) -> Self {
        Self {
            store,
            config,
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn detect_forgotten_beliefs<N: AsRef<str>, B: AsRef<str>>(
        &self,
        recent_loops: &[N],
        beliefs: &[B],
    ) -> Vec<String> {
        detect_forgotten_beliefs(recent_loops, beliefs, self.config.reference_threshold)
    }

    pub fn raise_alert(
        &self,
        loop_id: &str,
        missing_beliefs: Vec<String>,
        alignment_score: f64,
    ) -> Result<DriftOutcome, StoreError> {
        let now = self.clock.now();
        let (alert_type, suggestion) = if missing_beliefs.is_empty() {
            (
                AlertKind::AlignmentCheck,
                format!("All beliefs referenced recently; loop alignment {alignment_score:.2}"),
            )
        } else {
            (
                AlertKind::DriftDetected,
                format!(
                    "Reintroduce {} into upcoming plans: {}",
                    if missing_beliefs.len() == 1 {
                        "this belief"
                    } else {
                        "these beliefs"
                    },
                    missing_beliefs.join("; ")
                ),
            )
        };

        let alert = HistorianAlert {
            loop_id: loop_id.to_string(),
            alert_type,
            missing_beliefs,
            loop_belief_alignment_score: alignment_score,
            suggestion,
            timestamp: now,
        };
        info!(
            loop_id,
            alert_type = %alert.alert_type,
            missing = alert.missing_beliefs.len(),
            score = alignment_score,
            "historian alert"
        );
        self.store.append(LogName::HistorianAlerts, &alert)?;

        let severe_warning = if alignment_score < self.config.severe_threshold
            && !alert.missing_beliefs.is_empty()
        {
            let warning = SevereDriftWarning {
                loop_id: loop_id.to_string(),
                missing_beliefs: alert.missing_beliefs.clone(),
                loop_belief_alignment_score: alignment_score,
                threshold: self.config.severe_threshold,
                message: format!(
                    "Loop {loop_id} alignment {alignment_score:.2} below {:.2} with {} forgotten belief(s)",
                    self.config.severe_threshold,
                    alert.missing_beliefs.len()
                ),
                timestamp: now,
            };
            warn!(loop_id, score = alignment_score, "severe belief drift");
            self.store.append(LogName::SevereDriftWarnings, &warning)?;
            Some(warning)
        } else {
            None
        };

        Ok(DriftOutcome {
            alert,
            severe_warning,
        })
    }

    /// Score the newest loop summary, look for beliefs forgotten across the
    /// last `window` summaries (configured window when `None`) and raise the
    /// alert. `None` when no summaries exist.
    pub fn scan_recent_loops(&self, window: Option<usize>) -> Result<Option<DriftOutcome>, StoreError> {
        let summaries: Vec<LoopSummary> = self.store.read_log(LogName::LoopSummaries);
        if summaries.is_empty() {
            return Ok(None);
        }
        self.scan_ending_at(&summaries, summaries.len() - 1, window).map(Some)
    }

    /// Like [`Self::scan_recent_loops`], but scores `loop_id`'s own summary
    /// against the window of summaries ending at it. `None` when the loop
    /// has no summary.
    pub fn scan_loop(
        &self,
        loop_id: &str,
        window: Option<usize>,
    ) -> Result<Option<DriftOutcome>, StoreError> {
        let summaries: Vec<LoopSummary> = self.store.read_log(LogName::LoopSummaries);
        let Some(index) = summaries.iter().rposition(|s| s.loop_id == loop_id) else {
            return Ok(None);
        };
        self.scan_ending_at(&summaries, index, window).map(Some)
    }

    fn scan_ending_at(
        &self,
        summaries: &[LoopSummary],
        index: usize,
        window: Option<usize>,
    ) -> Result<DriftOutcome, StoreError> {
        let window = window.unwrap_or(self.config.window).max(1);
        let recent = &summaries[(index + 1).saturating_sub(window)..=index];
        let newest = &summaries[index];

        let beliefs: Vec<String> = self
            .store
            .read_log::<BeliefWeight>(LogName::BeliefWeights)
            .into_iter()
            .map(|b| b.belief)
            .collect();
        let narratives: Vec<&str> = recent.iter().map(|s| s.summary.as_str()).collect();

        let score = score_alignment(&newest.summary, &beliefs);
        let missing = self.detect_forgotten_beliefs(&narratives, &beliefs);
        self.raise_alert(&newest.loop_id, missing, score)
    }
}
