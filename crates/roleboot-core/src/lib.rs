//! roleboot-core — node role bootstrap for orchestrated clusters.
//!
//! Turns an undifferentiated node into a configured worker, discovering the
//! leader address and join token through a shared coordination store and
//! guarding the whole sequence with a durable sentinel.
//!
//! # Architecture
//!
//! ```text
//! external scheduler (tick)
//!   └── RoleBootstrap::attempt()
//!       ├── CoordinationStore   role / cluster / ip namespaces
//!       ├── SentinelGate        "already bootstrapped" marker
//!       ├── PlatformDetector → NodeDescriptor → ServiceHandle
//!       ├── AddressResolver     advertised node address
//!       └── HookRunner          before/after worker hooks
//! ```
//!
//! `attempt()` never sleeps or retries. Missing preconditions return
//! `Deferred` and the caller tries again later.

pub mod descriptor;
pub mod error;
pub mod hooks;
pub mod orchestrator;
pub mod sentinel;
pub mod store;
pub mod types;

pub use descriptor::{
    AddressResolver, NodeDescriptor, OrchestrationContext, PlatformDetector, ServiceHandle,
    StaticAddress,
};
pub use error::*;
pub use hooks::{HookRunner, NoopHooks};
pub use orchestrator::RoleBootstrap;
pub use sentinel::{FileSentinel, SentinelGate};
pub use store::CoordinationStore;
pub use types::*;
