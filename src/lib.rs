#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod admission;
pub mod audit;
pub mod clock;
pub mod config;
pub mod control_plane;
pub mod debugger;
pub mod enforcer;
pub mod error;
pub mod governance;
pub mod historian;
pub mod observability;
pub mod orchestrator;
pub mod reconciler;

pub use config::Config;
pub use control_plane::{ControlPlane, CycleInput, CycleReport, MemoryAccess};
pub use error::{GovError, GovResult};
