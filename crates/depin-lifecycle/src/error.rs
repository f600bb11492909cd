//! Lifecycle error taxonomy.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use depin_core::{CatalogError, WorkloadStatus};

/// The lifecycle operation an error or outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Install,
    Start,
    Stop,
    Uninstall,
    Logs,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Install => "install",
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Uninstall => "uninstall",
            Operation::Logs => "logs",
        })
    }
}

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("workload not found: {0}")]
    WorkloadNotFound(String),

    #[error("workload is already installed: {0}")]
    AlreadyInstalled(String),

    #[error("workload is not installed: {0}")]
    NotInstalled(String),

    #[error("cannot {operation} {workload_id} while it is {status}")]
    InvalidState {
        workload_id: String,
        operation: Operation,
        status: WorkloadStatus,
    },

    #[error("another operation is in progress for {0}")]
    OperationInProgress(String),

    #[error("container runtime is not available")]
    RuntimeUnavailable,

    #[error("failed to {operation} {workload_id}: {detail}")]
    Executor {
        workload_id: String,
        operation: Operation,
        detail: String,
        /// Captured stdout/stderr of the failed command.
        output: String,
    },

    #[error("{operation} of {workload_id} still running after {}s", .after.as_secs())]
    Timeout {
        workload_id: String,
        operation: Operation,
        after: Duration,
    },

    #[error("state store error: {0}")]
    Store(#[from] depin_state::StateError),

    #[error("catalog error: {0}")]
    Catalog(CatalogError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for LifecycleError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(id) => LifecycleError::WorkloadNotFound(id),
            other => LifecycleError::Catalog(other),
        }
    }
}

impl LifecycleError {
    /// Whether the error is a precondition violation for the current state.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            LifecycleError::AlreadyInstalled(_)
                | LifecycleError::NotInstalled(_)
                | LifecycleError::InvalidState { .. }
                | LifecycleError::OperationInProgress(_)
        )
    }

    /// Captured runtime output, when the failure came from the runtime.
    pub fn output(&self) -> Option<&str> {
        match self {
            LifecycleError::Executor { output, .. } => Some(output),
            _ => None,
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_not_found_maps_to_workload_not_found() {
        let err: LifecycleError = CatalogError::NotFound("grass".to_string()).into();
        assert!(matches!(err, LifecycleError::WorkloadNotFound(id) if id == "grass"));
    }

    #[test]
    fn malformed_catalog_entry_stays_a_catalog_error() {
        let err: LifecycleError = CatalogError::Malformed {
            id: "grass".to_string(),
            reason: "bad".to_string(),
        }
        .into();
        assert!(matches!(err, LifecycleError::Catalog(_)));
        assert!(!err.is_precondition());
    }

    #[test]
    fn messages_name_operation_and_workload() {
        let err = LifecycleError::InvalidState {
            workload_id: "grass".to_string(),
            operation: Operation::Start,
            status: WorkloadStatus::Running,
        };
        assert_eq!(err.to_string(), "cannot start grass while it is running");

        let err = LifecycleError::Timeout {
            workload_id: "grass".to_string(),
            operation: Operation::Install,
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "install of grass still running after 30s");
    }
}
