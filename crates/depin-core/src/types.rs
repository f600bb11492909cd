//! Shared types used across DePIN hub crates.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Catalog-derived workload identifier (the descriptor's directory name).
pub type WorkloadId = String;

/// Which network a workload's client participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Mainnet,
    Testnet,
    Devnet,
}

/// Minimum host resources a workload asks for. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub min_memory_gb: f64,
    #[serde(default)]
    pub min_cpu: f64,
    #[serde(default)]
    pub min_disk_gb: f64,
}

/// Locator for a workload's orchestration bundle.
///
/// Points at the compose file; the file's parent directory is the working
/// directory every runtime command is executed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleRef(PathBuf);

impl BundleRef {
    pub fn new(compose_file: impl Into<PathBuf>) -> Self {
        Self(compose_file.into())
    }

    /// Path of the compose file itself.
    pub fn compose_file(&self) -> &Path {
        &self.0
    }

    /// Directory context the bundle's relative references resolve against.
    pub fn dir(&self) -> &Path {
        self.0.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Immutable description of an installable workload, loaded from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadDescriptor {
    pub id: WorkloadId,
    pub name: String,
    pub description: String,
    pub company: String,
    pub version: String,
    pub category: String,
    pub bundle: BundleRef,
    /// External documentation link.
    pub docs: Option<String>,
    pub icon: Option<String>,
    pub network_status: NetworkStatus,
    pub requirements: ResourceRequirements,
}

/// Externally visible status of a workload.
///
/// `Available` means no installation record exists; the other variants
/// mirror the record's stored status. Always computed, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadStatus {
    Available,
    Running,
    Stopped,
    Error,
}

impl WorkloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadStatus::Available => "available",
            WorkloadStatus::Running => "running",
            WorkloadStatus::Stopped => "stopped",
            WorkloadStatus::Error => "error",
        }
    }
}

impl fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
