use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `loopgov`.
///
/// Governance outcomes (denials, rejections, escalations) are never errors;
/// they are data written to the audit trail. These variants cover the cases
/// where the control plane itself cannot do its job. Config loading reports
/// through `anyhow` and never reaches this type.
#[derive(Debug, Error)]
pub enum GovError {
    // ── Audit store ─────────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Store errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("log {log}: io: {source}")]
    Io {
        log: String,
        #[source]
        source: std::io::Error,
    },

    #[error("log {log}: serialize: {source}")]
    Serialize {
        log: String,
        #[source]
        source: serde_json::Error,
    },
}

// ─── Profile errors ──────────────────────────────────────────────────────────

/// Why a per-agent override was refused. The enforcer logs it as a
/// `config_elevation` violation and keeps the base profile.

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("override for agent {agent} widens {field} without elevation")]
    Elevation { agent: String, field: String },
}

pub type GovResult<T> = std::result::Result<T, GovError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevation_error_names_agent_and_field() {
        let err = ProfileError::Elevation {
            agent: "hal".into(),
            field: "allowed_tools".into(),
        };
        assert_eq!(
            err.to_string(),
            "override for agent hal widens allowed_tools without elevation"
        );
    }

    #[test]
    fn store_error_wraps_into_top_level() {
        let err: GovError = StoreError::Io {
            log: "violations".into(),
            source: std::io::Error::other("disk gone"),
        }
        .into();
        assert!(err.to_string().starts_with("store: log violations: io:"));
    }
}
