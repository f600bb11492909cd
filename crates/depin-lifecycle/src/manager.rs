//! LifecycleManager: drives installations through their state machine.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use depin_compose::{generate_project_name, ComposeOutput, ComposeRuntime, ContainerSummary};
use depin_core::config::LifecycleConfig;
use depin_core::{Catalog, WorkloadDescriptor, WorkloadStatus};
use depin_state::*;

use crate::error::{LifecycleError, LifecycleResult, Operation};
use crate::locks::WorkloadLocks;

/// Log tail used when the caller does not ask for a specific length.
pub const DEFAULT_LOG_TAIL: u32 = 100;

/// Waiting policy for lifecycle operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleOptions {
    /// How long a caller waits for an operation (including lock wait)
    /// before receiving `Timeout`. The operation keeps running.
    pub operation_timeout: Option<Duration>,
    /// How long to wait for an in-flight operation on the same workload
    /// before failing with `OperationInProgress`.
    pub lock_wait: Option<Duration>,
}

impl From<&LifecycleConfig> for LifecycleOptions {
    fn from(config: &LifecycleConfig) -> Self {
        Self {
            operation_timeout: config.operation_timeout(),
            lock_wait: config.lock_wait(),
        }
    }
}

/// A catalog workload enriched with its computed status.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadView {
    #[serde(flatten)]
    pub workload: WorkloadDescriptor,
    pub status: WorkloadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation: Option<InstallationRecord>,
}

/// Result of a successful lifecycle operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub workload_id: String,
    pub operation: Operation,
    pub status: WorkloadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation: Option<InstallationRecord>,
    /// Captured runtime output.
    pub output: String,
}

/// Answer to a status query.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub workload_id: String,
    pub status: WorkloadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Containers reported by the runtime, when a live probe was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containers: Option<Vec<ContainerSummary>>,
    /// Why the live probe could not be completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_error: Option<String>,
}

/// Aggregate view for service health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct HubSummary {
    pub runtime_available: bool,
    pub storage_ok: bool,
    pub total_workloads: usize,
    pub installed_workloads: usize,
    pub running_workloads: usize,
}

struct Inner {
    catalog: Catalog,
    store: StateStore,
    runtime: Arc<dyn ComposeRuntime>,
    locks: WorkloadLocks,
    options: LifecycleOptions,
}

/// Entry point for every lifecycle operation. Cheap to clone.
#[derive(Clone)]
pub struct LifecycleManager {
    inner: Arc<Inner>,
}

impl LifecycleManager {
    pub fn new(
        catalog: Catalog,
        store: StateStore,
        runtime: Arc<dyn ComposeRuntime>,
        options: LifecycleOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog,
                store,
                runtime,
                locks: WorkloadLocks::new(),
                options,
            }),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Every catalog workload with its computed status.
    pub fn list_workloads(&self) -> LifecycleResult<Vec<WorkloadView>> {
        let workloads = self.inner.catalog.list()?;
        let mut records: HashMap<String, InstallationRecord> = self
            .inner
            .store
            .list()?
            .into_iter()
            .map(|r| (r.workload_id.clone(), r))
            .collect();

        Ok(workloads
            .into_iter()
            .map(|workload| {
                let installation = records.remove(&workload.id);
                WorkloadView {
                    status: computed_status(installation.as_ref()),
                    workload,
                    installation,
                }
            })
            .collect())
    }

    /// One workload with its computed status.
    pub fn get_workload(&self, workload_id: &str) -> LifecycleResult<WorkloadView> {
        let workload = self.inner.catalog.get(workload_id)?;
        let installation = self.inner.store.get(workload_id)?;
        Ok(WorkloadView {
            status: computed_status(installation.as_ref()),
            workload,
            installation,
        })
    }

    /// Long-form documentation shipped with a workload.
    pub fn docs(&self, workload_id: &str) -> LifecycleResult<Option<String>> {
        Ok(self.inner.catalog.docs(workload_id)?)
    }

    /// Every installation record.
    pub fn installations(&self) -> LifecycleResult<Vec<InstallationRecord>> {
        Ok(self.inner.store.list()?)
    }

    /// Computed status, optionally enriched with the runtime's container list.
    pub async fn status(&self, workload_id: &str, live: bool) -> LifecycleResult<StatusReport> {
        self.inner.catalog.get(workload_id)?;
        let record = self.inner.store.get(workload_id)?;

        let mut report = StatusReport {
            workload_id: workload_id.to_string(),
            status: computed_status(record.as_ref()),
            project_name: record.as_ref().map(|r| r.project_name.clone()),
            containers: None,
            live_error: None,
        };

        if let (true, Some(record)) = (live, record.as_ref()) {
            let out = self.inner.runtime.ps(&record.project_name).await;
            if out.success {
                report.containers = Some(ContainerSummary::parse_list(&out.output));
            } else {
                debug!(%workload_id, error = out.error_detail(), "live status probe failed");
                report.live_error = Some(out.error_detail().to_string());
            }
        }

        Ok(report)
    }

    /// Last `tail` lines of the workload's container output.
    pub async fn logs(&self, workload_id: &str, tail: u32) -> LifecycleResult<String> {
        self.inner.catalog.get(workload_id)?;
        let record = self
            .inner
            .store
            .get(workload_id)?
            .ok_or_else(|| LifecycleError::NotInstalled(workload_id.to_string()))?;

        let out = self.inner.runtime.logs(&record.project_name, tail).await;
        if !out.success {
            return Err(executor_error(workload_id, Operation::Logs, out));
        }
        Ok(out.output)
    }

    /// Whether the container runtime currently responds.
    pub async fn runtime_available(&self) -> bool {
        self.inner.runtime.probe().await
    }

    /// Aggregate counts plus runtime and storage checks.
    pub async fn summary(&self) -> LifecycleResult<HubSummary> {
        let runtime_available = self.inner.runtime.probe().await;
        let storage_ok = match self.inner.store.check() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "installation store check failed");
                false
            }
        };
        let records = if storage_ok { self.inner.store.list()? } else { Vec::new() };
        Ok(HubSummary {
            runtime_available,
            storage_ok,
            total_workloads: self.inner.catalog.list()?.len(),
            installed_workloads: records.len(),
            running_workloads: records
                .iter()
                .filter(|r| r.status == InstallStatus::Running)
                .count(),
        })
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Bring a catalog workload up and record it as running.
    pub async fn install(&self, workload_id: &str) -> LifecycleResult<OperationOutcome> {
        let workload = self.inner.catalog.get(workload_id)?;
        self.run_exclusive(workload_id, Operation::Install, move |inner| {
            install_locked(inner, workload)
        })
        .await
    }

    /// Restart a stopped (or errored) installation.
    pub async fn start(&self, workload_id: &str) -> LifecycleResult<OperationOutcome> {
        let workload = self.inner.catalog.get(workload_id)?;
        self.run_exclusive(workload_id, Operation::Start, move |inner| {
            start_locked(inner, workload)
        })
        .await
    }

    /// Halt a running (or errored) installation without removing it.
    ///
    /// A failed stop moves the record to `Error` so the workload is flagged
    /// for attention; stop, start and uninstall remain available from there.
    pub async fn stop(&self, workload_id: &str) -> LifecycleResult<OperationOutcome> {
        let workload = self.inner.catalog.get(workload_id)?;
        self.run_exclusive(workload_id, Operation::Stop, move |inner| {
            stop_locked(inner, workload)
        })
        .await
    }

    /// Tear the project down and forget the installation.
    ///
    /// On failure the record is kept untouched so the operator can retry
    /// instead of losing track of leftover containers.
    pub async fn uninstall(&self, workload_id: &str) -> LifecycleResult<OperationOutcome> {
        let workload = self.inner.catalog.get(workload_id)?;
        self.run_exclusive(workload_id, Operation::Uninstall, move |inner| {
            uninstall_locked(inner, workload)
        })
        .await
    }

    /// Run `op` on its own task while holding the workload's lock.
    ///
    /// The caller's wait is bounded by `operation_timeout`; the task is
    /// detached rather than cancelled when that bound is hit.
    async fn run_exclusive<F, Fut>(
        &self,
        workload_id: &str,
        operation: Operation,
        op: F,
    ) -> LifecycleResult<OperationOutcome>
    where
        F: FnOnce(Arc<Inner>) -> Fut + Send + 'static,
        Fut: Future<Output = LifecycleResult<OperationOutcome>> + Send + 'static,
    {
        let options = self.inner.options;
        let inner = self.inner.clone();
        let id = workload_id.to_string();

        let work = async move {
            let Some(guard) = inner.locks.acquire(&id, options.lock_wait).await else {
                return Err(LifecycleError::OperationInProgress(id));
            };
            debug!(workload_id = %id, %operation, "workload lock acquired");

            let task = tokio::spawn(async move {
                let _guard = guard;
                op(inner).await
            });
            match task.await {
                Ok(result) => result,
                Err(e) => Err(LifecycleError::Internal(format!("{operation} task failed: {e}"))),
            }
        };

        match options.operation_timeout {
            None => work.await,
            Some(after) => match tokio::time::timeout(after, work).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%workload_id, %operation, timeout_secs = after.as_secs(), "caller stopped waiting; operation continues");
                    Err(LifecycleError::Timeout {
                        workload_id: workload_id.to_string(),
                        operation,
                        after,
                    })
                }
            },
        }
    }
}

// ── Operation bodies (run with the workload lock held) ─────────────

async fn install_locked(
    inner: Arc<Inner>,
    workload: WorkloadDescriptor,
) -> LifecycleResult<OperationOutcome> {
    let id = workload.id.as_str();
    if inner.store.get(id)?.is_some() {
        return Err(LifecycleError::AlreadyInstalled(id.to_string()));
    }
    ensure_runtime(&inner).await?;

    let project = generate_project_name(&workload.name, id);
    info!(workload_id = %id, %project, "installing workload");
    let out = inner.runtime.up(&workload.bundle, &project).await;
    if !out.success {
        error!(workload_id = %id, %project, error = out.error_detail(), "install failed");
        return Err(executor_error(id, Operation::Install, out));
    }

    let record = InstallationRecord::running(id, &project, epoch_secs());
    if let Err(e) = inner.store.put(&record) {
        error!(workload_id = %id, %project, error = %e, "project is up but its installation record was not saved");
        return Err(e.into());
    }
    info!(workload_id = %id, %project, "workload installed");
    Ok(outcome(id, Operation::Install, Some(record), out.output))
}

async fn start_locked(
    inner: Arc<Inner>,
    workload: WorkloadDescriptor,
) -> LifecycleResult<OperationOutcome> {
    let id = workload.id.as_str();
    let record = require_record(&inner, id)?;
    if record.status == InstallStatus::Running {
        return Err(invalid_state(id, Operation::Start, &record));
    }
    ensure_runtime(&inner).await?;

    let out = inner.runtime.start(&workload.bundle, &record.project_name).await;
    if !out.success {
        error!(workload_id = %id, project = %record.project_name, error = out.error_detail(), "start failed");
        return Err(executor_error(id, Operation::Start, out));
    }

    let updated = record.with_status(InstallStatus::Running, epoch_secs());
    inner.store.put(&updated)?;
    info!(workload_id = %id, project = %updated.project_name, "workload started");
    Ok(outcome(id, Operation::Start, Some(updated), out.output))
}

async fn stop_locked(
    inner: Arc<Inner>,
    workload: WorkloadDescriptor,
) -> LifecycleResult<OperationOutcome> {
    let id = workload.id.as_str();
    let record = require_record(&inner, id)?;
    if record.status == InstallStatus::Stopped {
        return Err(invalid_state(id, Operation::Stop, &record));
    }
    ensure_runtime(&inner).await?;

    let out = inner.runtime.stop(&workload.bundle, &record.project_name).await;
    if !out.success {
        error!(workload_id = %id, project = %record.project_name, error = out.error_detail(), "stop failed");
        let mut failed = record.with_status(InstallStatus::Error, epoch_secs());
        failed.last_error = Some(out.error_detail().to_string());
        if let Err(e) = inner.store.put(&failed) {
            warn!(workload_id = %id, error = %e, "could not record failed stop");
        }
        return Err(executor_error(id, Operation::Stop, out));
    }

    let updated = record.with_status(InstallStatus::Stopped, epoch_secs());
    inner.store.put(&updated)?;
    info!(workload_id = %id, project = %updated.project_name, "workload stopped");
    Ok(outcome(id, Operation::Stop, Some(updated), out.output))
}

async fn uninstall_locked(
    inner: Arc<Inner>,
    workload: WorkloadDescriptor,
) -> LifecycleResult<OperationOutcome> {
    let id = workload.id.as_str();
    let record = require_record(&inner, id)?;
    ensure_runtime(&inner).await?;

    info!(workload_id = %id, project = %record.project_name, "uninstalling workload");
    let out = inner.runtime.down(&workload.bundle, &record.project_name).await;
    if !out.success {
        error!(workload_id = %id, project = %record.project_name, error = out.error_detail(), "uninstall failed");
        return Err(executor_error(id, Operation::Uninstall, out));
    }

    inner.store.delete(id)?;
    info!(workload_id = %id, "workload uninstalled");
    Ok(outcome(id, Operation::Uninstall, None, out.output))
}

fn require_record(inner: &Inner, workload_id: &str) -> LifecycleResult<InstallationRecord> {
    inner
        .store
        .get(workload_id)?
        .ok_or_else(|| LifecycleError::NotInstalled(workload_id.to_string()))
}

async fn ensure_runtime(inner: &Inner) -> LifecycleResult<()> {
    if inner.runtime.probe().await {
        Ok(())
    } else {
        warn!("container runtime unavailable");
        Err(LifecycleError::RuntimeUnavailable)
    }
}

fn invalid_state(workload_id: &str, operation: Operation, record: &InstallationRecord) -> LifecycleError {
    LifecycleError::InvalidState {
        workload_id: workload_id.to_string(),
        operation,
        status: record.status.into(),
    }
}

fn executor_error(workload_id: &str, operation: Operation, out: ComposeOutput) -> LifecycleError {
    LifecycleError::Executor {
        workload_id: workload_id.to_string(),
        operation,
        detail: out.error.unwrap_or_else(|| "command failed".to_string()),
        output: out.output,
    }
}

fn outcome(
    workload_id: &str,
    operation: Operation,
    record: Option<InstallationRecord>,
    output: String,
) -> OperationOutcome {
    OperationOutcome {
        workload_id: workload_id.to_string(),
        operation,
        status: computed_status(record.as_ref()),
        installation: record,
        output,
    }
}

/// Current Unix time in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
