use super::support::plane;
use loopgov::audit::LogName;
use loopgov::clock::Clock;
use loopgov::debugger::FailureKind;
use loopgov::{CycleInput, MemoryAccess};
use serde_json::json;

fn cycle(agent: &str) -> CycleInput {
    CycleInput {
        project_id: "proj".into(),
        loop_id: "loop-1".into(),
        agent: agent.into(),
        ..CycleInput::default()
    }
}

#[test]
fn full_loop_walks_every_agent_and_restarts() {
    let (plane, _) = plane();
    let agents = ["core-forge", "hal", "nova", "critic", "sage", "memory"];
    let mut next = Vec::new();
    for agent in agents {
        let report = plane.run_cycle(&cycle(agent)).unwrap();
        next.push(report.next.unwrap());
    }

    let names: Vec<&str> = next.iter().map(|d| d.next_agent.as_str()).collect();
    assert_eq!(names, ["hal", "nova", "critic", "sage", "memory", "core-forge"]);
    assert_eq!(next.last().unwrap().loop_count, 2);
    assert_eq!(plane.store().entry_count(LogName::LoopDecisions), 6);
}

#[test]
fn memory_write_outside_scope_is_denied() {
    let (plane, _) = plane();
    let mut input = cycle("memory");
    input.memory = vec![MemoryAccess {
        scope: "global".into(),
        write: true,
    }];
    let report = plane.run_cycle(&input).unwrap();
    assert_eq!(report.denied, vec!["memory:global"]);
    assert!(report.next.is_none());
}

#[test]
fn failure_records_report_with_context() {
    let (plane, _) = plane();
    let mut input = cycle("hal");
    input.failure_evidence = Some("HTTP 403 Forbidden while calling the calendar".into());
    input.loop_context = Some(json!({"step": 3}));

    let report = plane.run_cycle(&input).unwrap();
    let debug = report.debugger_report.unwrap();
    assert_eq!(debug.failure_type, FailureKind::Permission);
    assert_eq!(debug.next_agent, "security");
    assert_eq!(debug.loop_context, Some(json!({"step": 3})));
    assert_eq!(plane.debugger().failure_history("loop-1").len(), 1);
}

#[test]
fn retry_budget_blocks_repeated_failures() {
    let (plane, _) = plane();
    let mut input = cycle("nova");
    input.action_id = Some("draft".into());
    input.failure_evidence = Some("ValueError: bad plan".into());

    for _ in 0..3 {
        assert!(plane.run_cycle(&input).unwrap().allowed());
    }
    let report = plane.run_cycle(&input).unwrap();
    assert_eq!(report.denied, vec!["retry_limit:draft"]);
}

#[test]
fn drift_scan_runs_once_when_the_loop_completes() {
    let (plane, _) = plane();
    let store = plane.store();
    store
        .append(LogName::BeliefWeights, &json!({"belief": "protect user privacy", "weight": 1.0}))
        .unwrap();
    for (loop_id, summary) in [
        ("loop-1", "Booked a meeting."),
        ("loop-2", "Protected user privacy while booking."),
    ] {
        store
            .append(LogName::LoopSummaries, &json!({"loop_id": loop_id, "summary": summary}))
            .unwrap();
    }

    let agents = ["core-forge", "hal", "nova", "critic", "sage", "memory"];
    let mut drifts = Vec::new();
    for agent in agents {
        let report = plane.run_cycle(&cycle(agent)).unwrap();
        drifts.extend(report.drift);
    }
    assert_eq!(drifts.len(), 1);
    let drift = &drifts[0];
    assert_eq!(drift.alert.loop_id, "loop-1");
    assert_eq!(drift.alert.missing_beliefs, vec!["protect user privacy"]);
    assert!(drift.severe_warning.is_some());
    assert_eq!(store.entry_count(LogName::HistorianAlerts), 1);
    assert_eq!(store.entry_count(LogName::SevereDriftWarnings), 1);
}

#[test]
fn records_are_stamped_by_the_plane_clock() {
    let (plane, clock) = plane();
    clock.advance(chrono::Duration::hours(3));
    let expected = clock.now();

    let mut input = cycle("hal");
    input.failure_evidence = Some("TimeoutError: upstream timed out".into());
    let report = plane.run_cycle(&input).unwrap();

    assert_eq!(report.debugger_report.unwrap().timestamp, expected);
    assert_eq!(report.next.unwrap().timestamp, expected);
}
