use serde::{Deserialize, Serialize};
use tracing::Level;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ObservabilityConfig {
    /// Parsed level; `None` when the configured name is not a tracing level.
    pub fn level(&self) -> Option<Level> {
        self.log_level.trim().parse::<Level>().ok()
    }
}
