use loopgov::audit::{AuditStore, LogName};
use loopgov::clock::ManualClock;
use loopgov::{Config, ControlPlane};
use serde_json::{Value, json};
use std::sync::Arc;

pub fn plane_with(config: Config) -> (ControlPlane, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let plane = ControlPlane::with_store(config, Arc::new(AuditStore::in_memory()), clock.clone());
    (plane, clock)
}

pub fn plane() -> (ControlPlane, Arc<ManualClock>) {
    plane_with(Config::default())
}

pub fn seed_comparison_set(store: &AuditStore, loop_id: &str, set_id: &str, plans: &[(&str, f64)]) {
    let candidates: Vec<Value> = plans
        .iter()
        .map(|(id, trust)| json!({"plan_id": id, "weighted_score": 0.5, "trust_alignment_score": trust}))
        .collect();
    store
        .append(
            LogName::ComparisonSets,
            &json!({"comparison_set_id": set_id, "loop_id": loop_id, "candidate_plans": candidates}),
        )
        .unwrap();
}

pub fn select(store: &AuditStore, loop_id: &str, set_id: &str, plan_id: &str) {
    store
        .append(
            LogName::PlanSelections,
            &json!({"loop_id": loop_id, "selected_plan_id": plan_id, "comparison_set_id": set_id}),
        )
        .unwrap();
}

pub fn set_loop_trust(store: &AuditStore, loop_id: &str, trust: f64) {
    store
        .write_document(LogName::TrustState, &json!({"loops": {loop_id: trust}}))
        .unwrap();
}
