//! Worker pool management.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use crate::crypto::KeypairSource;
use crate::matcher::SearchPattern;

use super::cpu::{CpuWorker, ExitNotice, WorkerEvent};

/// The set of worker threads running one search.
pub struct WorkerPool {
    /// Number of workers successfully spawned
    num_workers: usize,
    /// Worker thread handles (Option to allow taking during join)
    handles: Option<Vec<JoinHandle<()>>>,
    /// IDs of workers that have not yet announced their exit
    members: BTreeSet<usize>,
    /// Shared stop flag
    stop_flag: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawns `num_workers` worker threads searching for `pattern`.
    ///
    /// A worker whose thread cannot be spawned is logged and left out of the
    /// pool; the pool may therefore start with fewer members than requested.
    pub fn spawn(
        num_workers: usize,
        pattern: Arc<SearchPattern>,
        source: Arc<dyn KeypairSource>,
        events: Sender<WorkerEvent>,
        batch_size: u64,
    ) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(num_workers);
        let mut members = BTreeSet::new();

        for id in 0..num_workers {
            let pattern = pattern.clone();
            let source = source.clone();
            let events = events.clone();
            let stop_flag = stop_flag.clone();

            let spawned = thread::Builder::new()
                .name(format!("vanity-worker-{}", id))
                .spawn(move || {
                    let mut notice = ExitNotice::new(id, events.clone());
                    let worker = CpuWorker::new(id, pattern, source, events, stop_flag, batch_size);
                    if let Err(e) = worker.run() {
                        notice.fault(e.to_string());
                    }
                });

            match spawned {
                Ok(handle) => {
                    handles.push(handle);
                    members.insert(id);
                }
                Err(e) => warn!(worker_id = id, error = %e, "failed to spawn worker thread"),
            }
        }

        Self {
            num_workers: handles.len(),
            handles: Some(handles),
            members,
            stop_flag,
        }
    }

    /// Removes a worker from the membership set.
    ///
    /// Returns `false` if the worker had already been removed.
    pub fn mark_exited(&mut self, worker_id: usize) -> bool {
        self.members.remove(&worker_id)
    }

    /// Returns the number of workers still running.
    pub fn live(&self) -> usize {
        self.members.len()
    }

    /// Returns the number of workers spawned.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Signals all workers to stop. Safe to call any number of times.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Returns true if the pool has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Stops the workers and waits for every thread to finish.
    ///
    /// Workers notice the stop flag between batches, so this waits at most
    /// one batch per worker. Subsequent calls return immediately.
    pub fn join(&mut self) {
        self.stop();
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                if handle.join().is_err() {
                    debug!("worker thread ended in a panic");
                }
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join();
    }
}
