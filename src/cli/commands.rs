use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `loopgov` - governance control plane for multi-agent execution loops.
#[derive(Parser, Debug)]
#[command(name = "loopgov")]
#[command(version)]
#[command(about = "Governance control plane for multi-agent execution loops.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.loopgov/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print an agent's effective profile (override applied)
    Profile {
        /// Agent name
        agent: String,
    },

    /// Evaluate a loop's selected plan against governance thresholds
    Reject {
        #[arg(long = "loop", value_name = "ID")]
        loop_id: String,

        /// Evaluate every candidate of the loop's comparison set
        #[arg(long)]
        all_candidates: bool,
    },

    /// Escalate a loop whose candidate plans were all rejected
    Escalate {
        #[arg(long = "loop", value_name = "ID")]
        loop_id: String,
    },

    /// Classify failure evidence and record a debugger report
    Debug {
        #[arg(long = "loop", value_name = "ID")]
        loop_id: String,

        /// Failure evidence text
        #[arg(long, conflicts_with = "evidence_file", required_unless_present = "evidence_file")]
        evidence: Option<String>,

        /// Read failure evidence from a file
        #[arg(long, value_name = "PATH")]
        evidence_file: Option<PathBuf>,
    },

    /// Scan recent loop summaries for forgotten beliefs
    Drift {
        /// Number of recent summaries to scan (default from config)
        #[arg(long)]
        window: Option<usize>,
    },

    /// Replay loops and rewrite the governance alignment log
    Reconcile {
        /// Loop ids (default: reconciler.loop_ids from config)
        #[arg(long = "loop", value_name = "ID")]
        loop_ids: Vec<String>,
    },

    /// Walk the next-agent scheduler for a project
    Schedule {
        #[arg(long, value_name = "ID")]
        project: String,

        /// Agents to mark complete, in order
        #[arg(long, value_name = "AGENT")]
        complete: Vec<String>,
    },

    /// Show entry counts of every audit log
    Status,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn debug_requires_some_evidence() {
        assert!(Cli::try_parse_from(["loopgov", "debug", "--loop", "l1"]).is_err());
        assert!(
            Cli::try_parse_from(["loopgov", "debug", "--loop", "l1", "--evidence", "x", "--evidence-file", "f"])
                .is_err()
        );
    }

    #[test]
    fn reconcile_accepts_repeated_loops() {
        let cli = Cli::try_parse_from(["loopgov", "reconcile", "--loop", "a", "--loop", "b"]).unwrap();
        match cli.command {
            Commands::Reconcile { loop_ids } => assert_eq!(loop_ids, vec!["a", "b"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
