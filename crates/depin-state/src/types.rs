//! Persisted installation types.

use serde::{Deserialize, Serialize};

use depin_core::{WorkloadId, WorkloadStatus};

/// Lifecycle status stored on an installation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStatus {
    Running,
    Stopped,
    /// A lifecycle command failed and left the project in an unknown state.
    Error,
}

impl From<InstallStatus> for WorkloadStatus {
    fn from(status: InstallStatus) -> Self {
        match status {
            InstallStatus::Running => WorkloadStatus::Running,
            InstallStatus::Stopped => WorkloadStatus::Stopped,
            InstallStatus::Error => WorkloadStatus::Error,
        }
    }
}

/// Durable record of one installed workload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallationRecord {
    pub workload_id: WorkloadId,
    /// Runtime scoping name, generated once at install and never changed.
    pub project_name: String,
    pub status: InstallStatus,
    /// Unix timestamp (seconds) of the successful install.
    pub installed_at: u64,
    /// Unix timestamp (seconds) of the last status change.
    pub updated_at: u64,
    /// Diagnostic detail of the failure that set `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl InstallationRecord {
    /// A freshly installed, running workload.
    pub fn running(workload_id: &str, project_name: &str, now: u64) -> Self {
        Self {
            workload_id: workload_id.to_string(),
            project_name: project_name.to_string(),
            status: InstallStatus::Running,
            installed_at: now,
            updated_at: now,
            last_error: None,
        }
    }

    /// Copy of this record moved to `status`, keeping identity fields.
    pub fn with_status(&self, status: InstallStatus, now: u64) -> Self {
        Self {
            status,
            updated_at: now,
            last_error: None,
            ..self.clone()
        }
    }

    pub fn table_key(&self) -> &str {
        &self.workload_id
    }
}

/// Computed status for a workload given its (possibly absent) record.
pub fn computed_status(record: Option<&InstallationRecord>) -> WorkloadStatus {
    record.map_or(WorkloadStatus::Available, |r| r.status.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_record_is_available() {
        assert_eq!(computed_status(None), WorkloadStatus::Available);
    }

    #[test]
    fn with_status_keeps_identity() {
        let record = InstallationRecord::running("grass", "depin-grass-grass", 1000);
        let stopped = record.with_status(InstallStatus::Stopped, 2000);

        assert_eq!(stopped.project_name, record.project_name);
        assert_eq!(stopped.installed_at, 1000);
        assert_eq!(stopped.updated_at, 2000);
        assert_eq!(computed_status(Some(&stopped)), WorkloadStatus::Stopped);
    }

    #[test]
    fn last_error_is_omitted_when_empty() {
        let record = InstallationRecord::running("grass", "p", 1);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("last_error"));

        let parsed: InstallationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
