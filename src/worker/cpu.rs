//! CPU-based worker for vanity keypair search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use tracing::trace;

use crate::crypto::{KeypairResult, KeypairSource, SourceError};
use crate::matcher::SearchPattern;

/// Trials per batch between progress reports.
pub const DEFAULT_BATCH_SIZE: u64 = 10_000;

/// Messages a worker sends to the coordinator.
#[derive(Debug)]
pub enum WorkerEvent {
    /// A batch finished without a hit
    Progress { worker_id: usize, attempts: u64 },
    /// A matching keypair was found
    Found {
        worker_id: usize,
        result: KeypairResult,
    },
    /// The worker thread is exiting; `fault` is set on abnormal exit
    Exited {
        worker_id: usize,
        fault: Option<String>,
    },
}

/// A CPU worker that generates and tests keypairs.
pub struct CpuWorker {
    /// Worker ID
    id: usize,
    /// The pattern to match against
    pattern: Arc<SearchPattern>,
    /// Where candidates come from
    source: Arc<dyn KeypairSource>,
    /// Channel to the coordinator
    events: Sender<WorkerEvent>,
    /// Shared stop flag
    stop_flag: Arc<AtomicBool>,
    /// Trials per batch
    batch_size: u64,
}

impl CpuWorker {
    /// Creates a new CPU worker.
    pub fn new(
        id: usize,
        pattern: Arc<SearchPattern>,
        source: Arc<dyn KeypairSource>,
        events: Sender<WorkerEvent>,
        stop_flag: Arc<AtomicBool>,
        batch_size: u64,
    ) -> Self {
        Self {
            id,
            pattern,
            source,
            events,
            stop_flag,
            batch_size,
        }
    }

    /// Runs the worker loop.
    ///
    /// Generates keypairs in batches and tests them against the pattern until:
    /// - A match is found (sends it and returns)
    /// - Stop flag is set, checked between batches
    /// - Channel is closed
    /// - The source fails (returned as the fault)
    pub fn run(&self) -> Result<(), SourceError> {
        loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                return Ok(());
            }

            for _ in 0..self.batch_size {
                let keypair = self.source.generate()?;

                if self.pattern.matches(keypair.public_id()).is_match() {
                    trace!(worker_id = self.id, "match found");
                    let _ = self.events.send(WorkerEvent::Found {
                        worker_id: self.id,
                        result: keypair.into_result(),
                    });
                    return Ok(());
                }
            }

            let progress = WorkerEvent::Progress {
                worker_id: self.id,
                attempts: self.batch_size,
            };
            if self.events.send(progress).is_err() {
                return Ok(());
            }

            thread::yield_now();
        }
    }

    /// Returns the worker ID.
    pub fn id(&self) -> usize {
        self.id
    }
}

/// Announces a worker's exit when dropped, including during a panic.
pub(crate) struct ExitNotice {
    worker_id: usize,
    events: Sender<WorkerEvent>,
    fault: Option<String>,
}

impl ExitNotice {
    pub(crate) fn new(worker_id: usize, events: Sender<WorkerEvent>) -> Self {
        Self {
            worker_id,
            events,
            fault: None,
        }
    }

    /// Records why the worker stopped.
    pub(crate) fn fault(&mut self, fault: impl Into<String>) {
        self.fault = Some(fault.into());
    }
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        let fault = if thread::panicking() {
            Some("worker panicked".to_string())
        } else {
            self.fault.take()
        };
        let _ = self.events.send(WorkerEvent::Exited {
            worker_id: self.worker_id,
            fault,
        });
    }
}
