use super::Config;
use crate::admission::FallbackPolicy;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("LOOPGOV_AUDIT_DIR")
            && !dir.is_empty()
        {
            self.audit_dir = dir;
        }

        if let Ok(level) = std::env::var("LOOPGOV_LOG_LEVEL")
            && !level.is_empty()
        {
            self.observability.log_level = level;
        }

        if let Ok(policy) = std::env::var("LOOPGOV_FALLBACK_POLICY")
            && !policy.is_empty()
        {
            match policy.parse::<FallbackPolicy>() {
                Ok(parsed) => self.admission.fallback_policy = parsed,
                Err(_) => tracing::warn!(
                    %policy,
                    "ignoring unknown LOOPGOV_FALLBACK_POLICY"
                ),
            }
        }
    }
}
