use super::super::{
    AdmissionConfig, EnforcerConfig, HistorianConfig, ObservabilityConfig, ReconcilerConfig,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory holding the audit logs; `~` is expanded.
    #[serde(default = "default_audit_dir")]
    pub audit_dir: String,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub enforcer: EnforcerConfig,

    #[serde(default)]
    pub admission: AdmissionConfig,

    #[serde(default)]
    pub historian: HistorianConfig,

    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

fn default_audit_dir() -> String {
    "~/.loopgov/audit".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            audit_dir: default_audit_dir(),
            observability: ObservabilityConfig::default(),
            enforcer: EnforcerConfig::default(),
            admission: AdmissionConfig::default(),
            historian: HistorianConfig::default(),
            reconciler: ReconcilerConfig::default(),
        }
    }
}

impl Config {
    pub fn audit_dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.audit_dir).into_owned())
    }

    pub fn validate(&self) -> Result<()> {
        if self.audit_dir.trim().is_empty() {
            anyhow::bail!("audit_dir must not be empty");
        }
        self.enforcer.validate()?;
        self.admission.validate()?;
        self.historian.validate()?;
        self.reconciler.validate()?;
        Ok(())
    }
}
