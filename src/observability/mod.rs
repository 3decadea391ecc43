use crate::config::ObservabilityConfig;
use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Level from config; unknown names fall back to `info`.
pub fn resolve_level(config: &ObservabilityConfig) -> (Level, bool) {
    match config.level() {
        Some(level) => (level, true),
        None => (Level::INFO, false),
    }
}

/// Install the process-wide fmt subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let (level, recognised) = resolve_level(config);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;
    if !recognised {
        tracing::warn!(
            "Unknown log level '{}', falling back to info",
            config.log_level
        );
    }
    Ok(())
}
