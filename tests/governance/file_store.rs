use loopgov::audit::{AuditStore, LogName};
use serde_json::{Value, json};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn logs_are_pretty_json_arrays_on_disk() {
    let dir = TempDir::new().unwrap();
    let store = AuditStore::open(dir.path());
    store
        .append(LogName::Violations, &json!({"agent_name": "hal"}))
        .unwrap();

    let raw = fs::read_to_string(dir.path().join("violations.json")).unwrap();
    assert!(raw.contains('\n'));
    let parsed: Vec<Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.len(), 1);
}

#[test]
fn corrupt_log_is_treated_as_empty_and_recovered() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("plan_rejections.json"), "{ not json").unwrap();
    let store = AuditStore::open(dir.path());

    assert_eq!(store.entry_count(LogName::PlanRejections), 0);
    store
        .append(LogName::PlanRejections, &json!({"plan_id": "A"}))
        .unwrap();
    assert_eq!(store.entry_count(LogName::PlanRejections), 1);
}

#[test]
fn concurrent_writers_to_one_file_lose_nothing() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(AuditStore::open(dir.path()));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..5 {
                    store
                        .append(LogName::LoopDecisions, &json!({"worker": worker, "i": i}))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.entry_count(LogName::LoopDecisions), 20);
}
