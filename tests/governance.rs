#[path = "governance/admission_flow.rs"]
mod admission_flow;
#[path = "governance/cycle_flow.rs"]
mod cycle_flow;
#[path = "governance/enforcer_flow.rs"]
mod enforcer_flow;
#[path = "governance/file_store.rs"]
mod file_store;
#[path = "governance/reconcile_flow.rs"]
mod reconcile_flow;
#[path = "governance/support.rs"]
mod support;
