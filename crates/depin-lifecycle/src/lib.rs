//! depin-lifecycle: installation lifecycle manager.
//!
//! Turns catalog entries into running compose projects and keeps the
//! installation store in step with what the runtime actually did.
//!
//! # State machine
//!
//! ```text
//!             install                 stop
//! available ──────────▶ running ◀──────────▶ stopped
//!     ▲                   │  ▲    start        │
//!     │   uninstall       │  │ start           │
//!     └───────────────────┴──┼─────────────────┘
//!                            │
//!                 failed stop ▼
//!                          error ── stop / uninstall
//! ```
//!
//! # Architecture
//!
//! ```text
//! LifecycleManager
//!   ├── Catalog (read WorkloadDescriptor)
//!   ├── StateStore (read/write InstallationRecord)
//!   ├── ComposeRuntime (up / stop / start / down / logs / ps / probe)
//!   └── WorkloadLocks (one async mutex per workload id)
//! ```
//!
//! Every mutating operation runs on its own task while holding its
//! workload's lock, so check-then-act sequences for one workload never
//! interleave while different workloads proceed in parallel. A caller that
//! stops waiting (operation timeout) does not cancel the task: the runtime
//! command runs to completion and the resulting transition is still
//! persisted.

pub mod error;
pub mod locks;
pub mod manager;

pub use error::{LifecycleError, LifecycleResult, Operation};
pub use locks::WorkloadLocks;
pub use manager::{
    HubSummary, LifecycleManager, LifecycleOptions, OperationOutcome, StatusReport, WorkloadView,
    DEFAULT_LOG_TAIL,
};
