//! Per-workload mutual exclusion.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Registry of one async mutex per workload id.
///
/// Entries are created on demand and pruned once nobody holds or waits on
/// them, so the map stays proportional to in-flight work.
#[derive(Debug, Default, Clone)]
pub struct WorkloadLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl WorkloadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `workload_id`.
    ///
    /// `wait` of `None` waits for the current holder however long it takes.
    /// `Some(d)` gives up after `d` and returns `None`; a zero duration only
    /// succeeds if the lock is free right now.
    pub async fn acquire(
        &self,
        workload_id: &str,
        wait: Option<Duration>,
    ) -> Option<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Only the registry references an idle entry.
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            locks
                .entry(workload_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        match wait {
            None => Some(lock.lock_owned().await),
            Some(d) if d.is_zero() => lock.try_lock_owned().ok(),
            Some(d) => match tokio::time::timeout(d, lock.lock_owned()).await {
                Ok(guard) => Some(guard),
                Err(_) => {
                    debug!(%workload_id, wait_ms = d.as_millis() as u64, "gave up waiting for workload lock");
                    None
                }
            },
        }
    }

    /// Number of workloads currently tracked (held or awaited).
    pub async fn tracked(&self) -> usize {
        let locks = self.locks.lock().await;
        locks.values().filter(|m| Arc::strong_count(m) > 1).count()
    }
}
