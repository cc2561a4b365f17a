//! rolebootd — runs node role bootstrap as a daemon.
//!
//! Loads the TOML config, opens the local coordination store replica,
//! assembles the orchestrator with the k3s/k0s collaborators and drives it
//! from a scheduler loop until the node is sealed.

pub mod assemble;
pub mod config;
pub mod scheduler;

pub use assemble::{build_bootstrap, open_store};
pub use config::RolebootConfig;
pub use scheduler::{BootstrapScheduler, SchedulerExit};
