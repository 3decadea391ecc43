use crate::app::status::render_status;
use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use loopgov::{Config, ControlPlane};
use serde::Serialize;
use std::fs;
use tracing::info;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{rendered}");
    Ok(())
}

pub fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let plane = ControlPlane::open(config);

    match cli.command {
        Commands::Profile { agent } => print_json(&*plane.enforcer().profile(&agent)),

        Commands::Reject {
            loop_id,
            all_candidates,
        } => {
            let rejections = if all_candidates {
                plane.rejector().evaluate_comparison_set(&loop_id)?
            } else {
                plane
                    .rejector()
                    .process_rejection_for_loop(&loop_id)?
                    .into_iter()
                    .collect()
            };
            if rejections.is_empty() {
                println!("No plan rejected for loop {loop_id}");
                return Ok(());
            }
            print_json(&rejections)
        }

        Commands::Escalate { loop_id } => {
            match plane.escalation().check_for_escalation(&loop_id)? {
                Some(record) => print_json(&record),
                None => {
                    println!("No escalation for loop {loop_id}");
                    Ok(())
                }
            }
        }

        Commands::Debug {
            loop_id,
            evidence,
            evidence_file,
        } => {
            let evidence = match (evidence, evidence_file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path).with_context(|| {
                    format!("Failed to read evidence file {}", path.display())
                })?,
                (None, None) => anyhow::bail!("either --evidence or --evidence-file is required"),
            };
            let report = plane
                .debugger()
                .record_debugger_report(&loop_id, &evidence, None)?;
            print_json(&report)
        }

        Commands::Drift { window } => match plane.historian().scan_recent_loops(window)? {
            Some(outcome) => print_json(&outcome),
            None => {
                println!("No loop summaries recorded");
                Ok(())
            }
        },

        Commands::Reconcile { loop_ids } => {
            let entries = if loop_ids.is_empty() {
                plane.reconciler().run_reconciliation()?
            } else {
                plane.reconciler().run_reconciliation_for(&loop_ids)?
            };
            info!(loops = entries.len(), "reconciliation finished");
            print_json(&entries)
        }

        Commands::Schedule { project, complete } => {
            let scheduler = plane.scheduler();
            scheduler.initialize(&project);
            scheduler.trigger_next_agent(&project);
            for agent in &complete {
                scheduler.complete_agent(&project, agent);
                scheduler.trigger_next_agent(&project);
            }
            print_json(&scheduler.get_decisions(&project))
        }

        Commands::Status => {
            println!("{}", render_status(&plane));
            Ok(())
        }
    }
}
