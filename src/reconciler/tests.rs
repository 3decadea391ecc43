use super::*;
use crate::audit::AuditStore;
use crate::config::DefaultContextConfig;
use serde_json::json;
use std::sync::Arc;

fn setup() -> (Arc<AuditStore>, Reconciler) {
    let store = Arc::new(AuditStore::in_memory());
    let reader = ContextReader::new(store.clone(), DefaultContextConfig::default());
    let reconciler = Reconciler::new(
        reader,
        AdmissionConfig::default(),
        ReconcilerConfig {
            loop_ids: vec!["loop-1".into(), "ghost".into()],
            ..ReconcilerConfig::default()
        },
    );
    (store, reconciler)
}

fn seed_healthy_selection(store: &AuditStore) {
    store
        .append(
            LogName::ComparisonSets,
            &json!({
                "comparison_set_id": "cs-1",
                "loop_id": "loop-1",
                "candidate_plans": [
                    {"plan_id": "A", "weighted_score": 0.9, "trust_alignment_score": 0.8},
                    {"plan_id": "B", "weighted_score": 0.5, "trust_alignment_score": 0.6}
                ]
            }),
        )
        .unwrap();
    store
        .append(
            LogName::PlanSelections,
            &json!({"loop_id": "loop-1", "selected_plan_id": "A", "comparison_set_id": "cs-1"}),
        )
        .unwrap();
    store
        .write_document(
            LogName::EmotionState,
            &json!({"loops": {"loop-1": {"valence": 0.4, "arousal": 0.2}}}),
        )
        .unwrap();
    store
        .write_document(LogName::TrustState, &json!({"loops": {"loop-1": 0.9}}))
        .unwrap();
    store
        .append(
            LogName::LoopSummaries,
            &json!({"loop_id": "loop-1", "summary": "Chose plan A; the system should respect privacy."}),
        )
        .unwrap();
    store
        .append(
            LogName::BeliefWeights,
            &json!({"belief": "the system should respect privacy", "weight": 0.9}),
        )
        .unwrap();
}

#[test]
fn clean_selection_is_fully_aligned() {
    let (store, reconciler) = setup();
    seed_healthy_selection(&store);

    let entry = reconciler.reconcile_loop("loop-1");
    assert_eq!(entry.decision_point, DecisionPoint::PlanSelection);
    assert!(entry.misalignments.is_empty(), "{:?}", entry.misalignments);
    assert_eq!(entry.alignment_score, AlignmentScore::Score(1.0));
    assert_eq!(entry.processed_plan_details.candidate_plan_ids, vec!["A", "B"]);
}

#[test]
fn missing_loop_data_is_critical_and_not_scored() {
    let (_store, reconciler) = setup();
    let entry = reconciler.reconcile_loop("ghost");
    assert_eq!(entry.decision_point, DecisionPoint::DataUnavailable);
    assert_eq!(entry.alignment_score, AlignmentScore::NotAvailable);
    assert_eq!(entry.misalignments.len(), 1);
    assert_eq!(entry.misalignments[0].surface, Surface::LoopData);
    assert_eq!(entry.misalignments[0].severity, Severity::Critical);
}

#[test]
fn selection_under_bad_context_collects_each_surface() {
    let (store, reconciler) = setup();
    seed_healthy_selection(&store);
    store
        .write_document(
            LogName::EmotionState,
            &json!({"loops": {"loop-1": {"valence": -0.9, "arousal": 0.95}}}),
        )
        .unwrap();
    store
        .write_document(LogName::TrustState, &json!({"loops": {"loop-1": 0.3}}))
        .unwrap();

    let entry = reconciler.reconcile_loop("loop-1");
    let severities: Vec<(Surface, Severity)> = entry
        .misalignments
        .iter()
        .map(|m| (m.surface, m.severity))
        .collect();
    assert_eq!(
        severities,
        vec![
            (Surface::Emotion, Severity::High),
            (Surface::Emotion, Severity::Medium),
            (Surface::Trust, Severity::Medium),
        ]
    );
    assert_eq!(entry.alignment_score, AlignmentScore::Score(0.0));
}

#[test]
fn rejected_candidate_with_better_trust_is_low() {
    let (store, reconciler) = setup();
    seed_healthy_selection(&store);
    store
        .append(
            LogName::ComparisonSets,
            &json!({
                "comparison_set_id": "cs-2",
                "loop_id": "loop-1",
                "candidate_plans": [
                    {"plan_id": "C", "weighted_score": 0.9, "trust_alignment_score": 0.55},
                    {"plan_id": "D", "weighted_score": 0.5, "trust_alignment_score": 0.95}
                ]
            }),
        )
        .unwrap();
    store
        .append(
            LogName::PlanSelections,
            &json!({"loop_id": "loop-1", "selected_plan_id": "C", "comparison_set_id": "cs-2"}),
        )
        .unwrap();
    store
        .append(
            LogName::PlanRejections,
            &json!({
                "log_entry_id": "r-1",
                "loop_id": "loop-1",
                "plan_id": "D",
                "comparison_set_id": "cs-2",
                "rejection_reason": "trust",
                "triggering_metric": "trust_score",
                "threshold_details": {"metric_path": "trust_score", "threshold_value": 0.5, "actual_value": 0.2, "condition": "less_than"},
                "timestamp": "2026-01-01T00:00:00Z",
                "governance_context": {
                    "loop_id": "loop-1",
                    "emotion_state": {"valence": 0.4, "arousal": 0.2},
                    "emotion_source": "loop",
                    "trust_score": 0.2,
                    "trust_source": "loop",
                    "critical_invariant_violations": 0,
                    "non_critical_invariant_violations": 0,
                    "violated_invariants": []
                },
                "all_rejection_triggers": []
            }),
        )
        .unwrap();

    let entry = reconciler.reconcile_loop("loop-1");
    assert_eq!(entry.misalignments.len(), 1);
    assert_eq!(entry.misalignments[0].severity, Severity::Low);
    assert_eq!(entry.processed_plan_details.rejected_plan_ids, vec!["D"]);
    assert_eq!(entry.alignment_score.value(), Some(0.9));
}

#[test]
fn unreferenced_heavy_belief_is_low() {
    let (store, reconciler) = setup();
    seed_healthy_selection(&store);
    store
        .append(LogName::BeliefWeights, &json!({"belief": "minimise carbon footprint", "weight": 0.8}))
        .unwrap();
    store
        .append(LogName::BeliefWeights, &json!({"belief": "celebrate small wins", "weight": 0.2}))
        .unwrap();

    let entry = reconciler.reconcile_loop("loop-1");
    assert_eq!(entry.misalignments.len(), 1);
    assert_eq!(entry.misalignments[0].surface, Surface::Belief);
    assert_eq!(entry.misalignments[0].severity, Severity::Low);
}

#[test]
fn run_rewrites_alignment_log_wholesale() {
    let (store, reconciler) = setup();
    seed_healthy_selection(&store);

    let first = reconciler.run_reconciliation().unwrap();
    assert_eq!(first.len(), 2);
    let second = reconciler.run_reconciliation().unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(store.entry_count(LogName::GovernanceAlignment), 2);

    let logged: Vec<AlignmentLogEntry> = store.read_log(LogName::GovernanceAlignment);
    assert_eq!(logged[1].alignment_score, AlignmentScore::NotAvailable);
}
