mod admission;
mod core;
mod enforcer;
mod historian;
mod observability;

pub use admission::{AdmissionConfig, DefaultContextConfig};
pub use core::Config;
pub use enforcer::EnforcerConfig;
pub use historian::{HistorianConfig, ReconcilerConfig};
pub use observability::ObservabilityConfig;
