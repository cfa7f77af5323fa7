//! Deferred removal of the pipeline's temporary files.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::{self, JoinHandle};

use super::file;

/// A scheduled deletion and the files it will remove.
struct PendingRemoval {
    handle: JoinHandle<()>,
    paths: Vec<PathBuf>,
}

/// Removes temporary artifacts either right away or after a fixed delay.
#[derive(Clone)]
pub struct CleanupScheduler {
    runtime: Handle,
    delay: Duration,
    pending: Arc<Mutex<Vec<PendingRemoval>>>,
}

impl CleanupScheduler {
    pub fn new(runtime: Handle, delay: Duration) -> Self {
        Self {
            runtime,
            delay,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delete `paths` once the delay has elapsed.
    pub fn schedule(&self, paths: Vec<PathBuf>) {
        let delay = self.delay;
        log::debug!(
            "Scheduling removal of {} temporary file(s) in {:?}",
            paths.len(),
            delay
        );
        let timer_paths = paths.clone();
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = task::spawn_blocking(move || file::remove_artifacts(&timer_paths)).await
            {
                log::warn!("Temporary file cleanup task failed: {}", e);
            }
        });

        match self.pending.lock() {
            Ok(mut pending) => {
                pending.retain(|removal| !removal.handle.is_finished());
                pending.push(PendingRemoval { handle, paths });
            }
            Err(_) => log::warn!("Cleanup bookkeeping lock poisoned; deletion still scheduled"),
        }
    }

    /// Stop the timers of deletions that have not run yet and delete their
    /// files now. Runs reuse fixed paths, so no older timer may fire once a
    /// new run has started.
    pub async fn remove_pending_now(&self) {
        let pending = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };

        let mut paths = Vec::new();
        for removal in pending {
            removal.handle.abort();
            paths.extend(removal.paths);
        }
        if paths.is_empty() {
            return;
        }

        log::debug!("Removing {} file(s) left by the previous run", paths.len());
        self.remove_now(paths).await;
    }

    /// Delete `paths` without waiting for the delay.
    pub async fn remove_now(&self, paths: Vec<PathBuf>) {
        if let Err(e) = task::spawn_blocking(move || file::remove_artifacts(&paths)).await {
            log::warn!("Temporary file cleanup task failed: {}", e);
        }
    }

    /// Wait until every scheduled deletion has run. Used before a one-shot
    /// process exits so no temporary file outlives it.
    pub async fn wait_idle(&self) {
        let pending = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for removal in pending {
            if let Err(e) = removal.handle.await
                && !e.is_cancelled()
            {
                log::warn!("Temporary file cleanup task failed: {}", e);
            }
        }
    }
}
