//! roleboot-node — concrete platform collaborators.
//!
//! Implements the descriptor, service, hook and address contracts from
//! `roleboot-core` for k3s and k0s nodes supervised by systemd or OpenRC.
//! Every filesystem path is resolved under a configurable root so the
//! whole crate can run against a scratch directory.

pub mod address;
pub mod config;
pub mod distro;
pub mod exec;
pub mod hooks;
pub mod node;
pub mod service;

pub use address::LocalAddress;
pub use config::{PlatformConfig, ServiceCommands};
pub use distro::{Distro, DistroDetector};
pub use hooks::CommandHookRunner;
pub use node::DistroNode;
pub use service::{OpenRcService, ServiceManager, SystemdUnit};
