//! depin-state: durable installation store for the DePIN hub.
//!
//! Backed by [redb](https://docs.rs/redb). Holds one `InstallationRecord`
//! per installed workload, keyed by workload id. A missing record means the
//! workload is not installed.
//!
//! # Architecture
//!
//! Records are JSON-serialized into redb's `&[u8]` value column. Every
//! `put`/`delete` is its own committed write transaction, so readers see
//! either the old or the new record, never a partial one, and the change
//! survives a restart once the call returns.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
