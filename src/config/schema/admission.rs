use crate::admission::FallbackPolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Plan admission thresholds and escalation fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    #[serde(default = "default_min_negative_valence")]
    pub min_negative_valence: f64,
    #[serde(default = "default_min_positive_valence")]
    pub min_positive_valence: f64,
    #[serde(default = "default_max_arousal")]
    pub max_arousal_under_negative_valence: f64,
    #[serde(default = "default_min_trust_score")]
    pub min_trust_score: f64,
    #[serde(default)]
    pub max_critical_invariant_violations: u32,
    #[serde(default)]
    pub max_non_critical_invariant_violations: u32,
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,
    #[serde(default)]
    pub default_context: DefaultContextConfig,
}

/// Governance context assumed when a loop has no emotion or trust data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DefaultContextConfig {
    #[serde(default)]
    pub valence: f64,
    #[serde(default)]
    pub arousal: f64,
    #[serde(default = "default_trust_score")]
    pub trust_score: f64,
}

fn default_min_negative_valence() -> f64 {
    -0.7
}

fn default_min_positive_valence() -> f64 {
    0.2
}

fn default_max_arousal() -> f64 {
    0.8
}

fn default_min_trust_score() -> f64 {
    0.5
}

fn default_trust_score() -> f64 {
    0.7
}

impl Default for DefaultContextConfig {
    fn default() -> Self {
        Self {
            valence: 0.0,
            arousal: 0.0,
            trust_score: default_trust_score(),
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            min_negative_valence: default_min_negative_valence(),
            min_positive_valence: default_min_positive_valence(),
            max_arousal_under_negative_valence: default_max_arousal(),
            min_trust_score: default_min_trust_score(),
            max_critical_invariant_violations: 0,
            max_non_critical_invariant_violations: 0,
            fallback_policy: FallbackPolicy::default(),
            default_context: DefaultContextConfig::default(),
        }
    }
}

fn check_range(label: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_nan() {
        anyhow::bail!("admission.{label} must not be NaN");
    }
    if !(min..=max).contains(&value) {
        anyhow::bail!("admission.{label} must be in [{min}, {max}]");
    }
    Ok(())
}

impl AdmissionConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("min_negative_valence", self.min_negative_valence, -1.0, 0.0)?;
        check_range("min_positive_valence", self.min_positive_valence, 0.0, 1.0)?;
        check_range(
            "max_arousal_under_negative_valence",
            self.max_arousal_under_negative_valence,
            0.0,
            1.0,
        )?;
        check_range("min_trust_score", self.min_trust_score, 0.0, 1.0)?;
        check_range("default_context.valence", self.default_context.valence, -1.0, 1.0)?;
        check_range("default_context.arousal", self.default_context.arousal, 0.0, 1.0)?;
        check_range(
            "default_context.trust_score",
            self.default_context.trust_score,
            0.0,
            1.0,
        )?;
        Ok(())
    }
}
