use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorianConfig {
    /// Number of most recent loop summaries scanned for forgotten beliefs.
    #[serde(default = "default_window")]
    pub window: usize,
    /// A belief counts as referenced once a loop scores it above this.
    #[serde(default = "default_reference_threshold")]
    pub reference_threshold: f64,
    /// Alignment below this (with missing beliefs) raises a severe warning.
    #[serde(default = "default_severe_threshold")]
    pub severe_threshold: f64,
}

fn default_window() -> usize {
    5
}

fn default_reference_threshold() -> f64 {
    0.3
}

fn default_severe_threshold() -> f64 {
    0.3
}

impl Default for HistorianConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            reference_threshold: default_reference_threshold(),
            severe_threshold: default_severe_threshold(),
        }
    }
}

impl HistorianConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            anyhow::bail!("historian.window must be >= 1");
        }
        for (label, value) in [
            ("reference_threshold", self.reference_threshold),
            ("severe_threshold", self.severe_threshold),
        ] {
            if value.is_nan() || !(0.0..=1.0).contains(&value) {
                anyhow::bail!("historian.{label} must be in [0.0, 1.0]");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Loops replayed by a full reconciliation run.
    #[serde(default)]
    pub loop_ids: Vec<String>,
    /// Beliefs at or above this weight must show up in a loop's narrative.
    #[serde(default = "default_belief_weight_floor")]
    pub belief_weight_floor: f64,
}

fn default_belief_weight_floor() -> f64 {
    0.7
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            loop_ids: Vec::new(),
            belief_weight_floor: default_belief_weight_floor(),
        }
    }
}

impl ReconcilerConfig {
    pub fn validate(&self) -> Result<()> {
        let floor = self.belief_weight_floor;
        if floor.is_nan() || !(0.0..=1.0).contains(&floor) {
            anyhow::bail!("reconciler.belief_weight_floor must be in [0.0, 1.0]");
        }
        Ok(())
    }
}
