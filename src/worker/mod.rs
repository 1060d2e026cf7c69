//! Worker pool for parallel vanity keypair search.
//!
//! This module provides:
//! - Multi-threaded CPU workers
//! - The coordinator racing them for the first match
//! - Progress tracking and reporting

mod coordinator;
mod cpu;
mod pool;
mod progress;

pub use coordinator::{
    default_cores, search, Coordinator, FirstWins, SearchError, SearchOptions, SearchOutcome,
    SearchReport, DEFAULT_REPORT_INTERVAL, DEFAULT_TIMEOUT,
};
pub use cpu::{CpuWorker, WorkerEvent, DEFAULT_BATCH_SIZE};
pub use pool::WorkerPool;
pub use progress::{format_number, Progress, ProgressSnapshot};
