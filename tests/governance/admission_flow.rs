use super::support::{plane, plane_with, seed_comparison_set, select, set_loop_trust};
use loopgov::Config;
use loopgov::admission::{EscalationAction, FallbackPolicy};
use loopgov::audit::LogName;

#[test]
fn partial_then_total_rejection_escalates_once() {
    let (plane, _) = plane();
    let store = plane.store();
    seed_comparison_set(store, "loop-1", "cs-1", &[("A", 0.8), ("B", 0.6)]);
    select(store, "loop-1", "cs-1", "A");
    set_loop_trust(store, "loop-1", 0.2);

    let rejection = plane
        .rejector()
        .process_rejection_for_loop("loop-1")
        .unwrap()
        .unwrap();
    assert_eq!(rejection.plan_id, "A");
    assert_eq!(rejection.triggering_metric, "trust_score");
    assert!(plane.escalation().check_for_escalation("loop-1").unwrap().is_none());

    let all = plane.rejector().evaluate_comparison_set("loop-1").unwrap();
    assert_eq!(all.len(), 2);

    let escalation = plane
        .escalation()
        .check_for_escalation("loop-1")
        .unwrap()
        .unwrap();
    assert_eq!(escalation.rejected_plan_ids, vec!["A", "B"]);
    assert_eq!(escalation.governance_summary.total_plans_rejected, 2);
    assert_eq!(
        escalation.recommended_action,
        EscalationAction::OperatorReviewRequired
    );

    plane.escalation().check_for_escalation("loop-1").unwrap();
    assert_eq!(store.entry_count(LogName::PlanEscalations), 1);
}

#[test]
fn regeneration_fallback_comes_from_config() {
    let mut config = Config::default();
    config.admission.fallback_policy = FallbackPolicy::AttemptRegenerationSimple;
    let (plane, _) = plane_with(config);
    let store = plane.store();
    seed_comparison_set(store, "loop-9", "cs-9", &[("only", 0.9)]);
    set_loop_trust(store, "loop-9", 0.1);

    plane.rejector().evaluate_comparison_set("loop-9").unwrap();
    let escalation = plane
        .escalation()
        .check_for_escalation("loop-9")
        .unwrap()
        .unwrap();
    assert_eq!(
        escalation.recommended_action,
        EscalationAction::TriggerFallbackProcedure
    );
    assert!(escalation.fallback_triggered);
    assert!(!escalation.operator_alert_flag);
}

#[test]
fn healthy_defaults_approve_the_selection() {
    let (plane, _) = plane();
    let store = plane.store();
    seed_comparison_set(store, "loop-2", "cs-2", &[("A", 0.8)]);
    select(store, "loop-2", "cs-2", "A");

    assert!(plane.rejector().process_rejection_for_loop("loop-2").unwrap().is_none());
    assert_eq!(store.entry_count(LogName::PlanRejections), 0);
}
