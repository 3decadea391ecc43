use super::support::{plane_with, seed_comparison_set, select};
use loopgov::Config;
use loopgov::audit::LogName;
use loopgov::reconciler::{AlignmentScore, DecisionPoint, Severity, Surface};
use serde_json::{Value, json};

#[test]
fn reconciliation_covers_configured_loops() {
    let mut config = Config::default();
    config.reconciler.loop_ids = vec!["loop-1".into(), "loop-missing".into()];
    let (plane, _) = plane_with(config);
    let store = plane.store();
    seed_comparison_set(store, "loop-1", "cs-1", &[("A", 0.3)]);
    select(store, "loop-1", "cs-1", "A");
    store
        .write_document(
            LogName::EmotionState,
            &json!({"current": {"valence": 0.2, "arousal": 0.1}}),
        )
        .unwrap();
    store
        .write_document(LogName::TrustState, &json!({"current": 0.9}))
        .unwrap();
    store
        .append(
            LogName::LoopSummaries,
            &json!({"loop_id": "loop-1", "summary": "Plan A shipped."}),
        )
        .unwrap();

    let entries = plane.reconciler().run_reconciliation().unwrap();
    assert_eq!(entries.len(), 2);

    let first = &entries[0];
    assert_eq!(first.decision_point, DecisionPoint::PlanSelection);
    assert_eq!(first.misalignments.len(), 1);
    assert_eq!(first.misalignments[0].surface, Surface::Trust);
    assert_eq!(first.misalignments[0].severity, Severity::High);
    assert_eq!(first.alignment_score, AlignmentScore::Score(0.5));

    let missing = &entries[1];
    assert_eq!(missing.alignment_score, AlignmentScore::NotAvailable);

    let raw: Vec<Value> = store.read_log(LogName::GovernanceAlignment);
    assert_eq!(raw[1]["alignment_score"], json!("N/A"));
    assert_eq!(raw[1]["misalignments"][0]["severity"], json!("critical"));
}

#[test]
fn escalated_loop_without_invariants_is_flagged_soft() {
    let (plane, _) = plane_with(Config::default());
    let store = plane.store();
    seed_comparison_set(store, "loop-3", "cs-3", &[("A", 0.9)]);
    store
        .write_document(LogName::TrustState, &json!({"loops": {"loop-3": 0.1}}))
        .unwrap();
    plane.rejector().evaluate_comparison_set("loop-3").unwrap();
    plane.escalation().check_for_escalation("loop-3").unwrap().unwrap();

    let entry = plane.reconciler().reconcile_loop("loop-3");
    assert_eq!(entry.decision_point, DecisionPoint::PlanEscalation);
    assert!(
        entry
            .misalignments
            .iter()
            .any(|m| m.surface == Surface::Invariant && m.severity == Severity::Low)
    );
    assert!(entry.processed_plan_details.escalated);
}
