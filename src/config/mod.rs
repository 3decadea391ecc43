pub mod schema;

pub use schema::{
    AdmissionConfig, Config, DefaultContextConfig, EnforcerConfig, HistorianConfig,
    ObservabilityConfig, ReconcilerConfig,
};
