//! depin-compose: orchestration executor for the DePIN hub.
//!
//! Issues lifecycle commands to the container runtime's compose tool and
//! folds every outcome into a [`ComposeOutput`] value. Nothing here returns
//! an error: a command that could not be spawned, exited non-zero, or ran
//! past its timeout is reported as `success == false` with the captured
//! stdout/stderr and a human-readable detail.
//!
//! # Architecture
//!
//! ```text
//! ComposeRuntime (trait, injected for testability)
//!   └── DockerCompose
//!       ├── docker compose -f <bundle> -p <project> up -d | stop | start
//!       ├── docker compose -f <bundle> -p <project> down --volumes --remove-orphans
//!       ├── docker compose -p <project> logs --tail=N | ps --format json
//!       └── probe: docker compose version + docker info
//! ```
//!
//! Bundle commands execute with the bundle's directory as working directory
//! so relative paths inside the compose file resolve. Project names are
//! re-sanitized right before they reach the runtime.

pub mod docker;
pub mod project;
pub mod runtime;

pub use docker::DockerCompose;
pub use project::{generate_project_name, sanitize_project_name};
pub use runtime::{ComposeFuture, ComposeOutput, ComposeRuntime, ContainerSummary, ProbeFuture};
