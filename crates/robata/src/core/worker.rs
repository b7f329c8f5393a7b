//! Handle for the long-lived batch scheduling task.

use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use tokio::{task::JoinHandle, sync::Notify};

/// Owns the background scheduling task: spawn, wake, graceful shutdown.
///
/// The handle carries a running flag and a shutdown notify. The task is
/// expected to check the flag each cycle and to park on the notify whenever
/// it would otherwise block forever (the collector's wait for a first
/// request), so `shutdown` can always reach it.
///
/// Dropping the handle shuts the task down.
pub struct BatchWorkerHandle {
    /// Cleared to stop the background task at its next cycle boundary.
    running: Arc<AtomicBool>,

    /// Spawned task, taken once shutdown is initiated.
    handle: Option<JoinHandle<()>>,

    /// Wakes the task out of an unbounded wait so it can observe `running`.
    notifier: Arc<Notify>,
}

impl BatchWorkerHandle {
    /// Spawns the worker. `task` receives the running flag and the shutdown
    /// notify and returns the join handle of the spawned loop.
    pub fn new<F>(task: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>, Arc<Notify>) -> JoinHandle<()>,
    {
        let running = Arc::new(AtomicBool::new(true));
        let notifier = Arc::new(Notify::new());
        let handle = task(running.clone(), notifier.clone());

        Self {
            running,
            handle: Some(handle),
            notifier,
        }
    }

    #[allow(dead_code)]
    pub fn running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    #[allow(dead_code)]
    pub fn notifier(&self) -> Arc<Notify> {
        self.notifier.clone()
    }

    /// Initiates shutdown: clears the running flag, wakes the task, and
    /// detaches a reaper for the join handle.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.notifier.notify_one();

        if let Some(handle) = self.handle.take() {
            tokio::spawn(async move {
                let _ = handle.await;
            });
        }
    }
}

impl Drop for BatchWorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
