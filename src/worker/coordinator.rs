//! Search coordination: the first-result-wins race between workers.
//!
//! One search resolves to exactly one [`SearchOutcome`]. Whichever of a
//! worker's match, the deadline, an emptied pool or a shutdown request is
//! observed first wins; everything arriving later is ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{after, select, tick, unbounded};
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;
use crate::crypto::{Ed25519Source, KeypairResult, KeypairSource};
use crate::matcher::SearchPattern;

use super::cpu::{WorkerEvent, DEFAULT_BATCH_SIZE};
use super::pool::WorkerPool;
use super::progress::Progress;

/// Default wall-clock limit for one search.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default cadence of progress snapshots.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Returns the default worker count: all CPUs but two, at least one.
pub fn default_cores() -> usize {
    num_cpus::get().saturating_sub(2).max(1)
}

/// Tuning parameters for one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Give up after this long
    pub timeout: Duration,
    /// Number of worker threads
    pub cores: usize,
    /// Trials per worker batch
    pub batch_size: u64,
    /// Interval between progress snapshots
    pub report_interval: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cores: default_cores(),
            batch_size: DEFAULT_BATCH_SIZE,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

impl SearchOptions {
    /// Options with the given timeout and worker count, defaults otherwise.
    pub fn new(timeout: Duration, cores: usize) -> Self {
        Self {
            timeout,
            cores,
            ..Self::default()
        }
    }

    /// Validates the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cores == 0 {
            return Err(ConfigError::InvalidOption(
                "Worker count must be at least 1".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidOption(
                "Timeout must be greater than zero".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidOption(
                "Batch size must be at least 1".into(),
            ));
        }
        if self.report_interval.is_zero() {
            return Err(ConfigError::InvalidOption(
                "Report interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// How a search ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A worker found a matching keypair
    Found(KeypairResult),
    /// The deadline passed first
    TimedOut(Duration),
    /// Every worker exited without a match
    Exhausted { workers: usize },
    /// A shutdown was requested while searching
    Cancelled,
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }

    /// Converts to the error-for-failure convention.
    pub fn into_result(self) -> Result<KeypairResult, SearchError> {
        match self {
            SearchOutcome::Found(result) => Ok(result),
            SearchOutcome::TimedOut(timeout) => Err(SearchError::TimedOut(timeout)),
            SearchOutcome::Exhausted { workers } => Err(SearchError::Exhausted { workers }),
            SearchOutcome::Cancelled => Err(SearchError::Cancelled),
        }
    }
}

/// Why a search produced no keypair.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Keypair generation timed out after {} seconds", .0.as_secs())]
    TimedOut(Duration),

    #[error("All {workers} workers exited without finding a result")]
    Exhausted { workers: usize },

    #[error("Search cancelled before a result was found")]
    Cancelled,
}

/// Summary of a finished search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    /// Attempts reported by the workers
    pub attempts: u64,
    pub elapsed: Duration,
    /// Pool membership at the moment the outcome was decided
    pub live_workers: usize,
    /// Matches that arrived after the outcome was decided and were discarded
    pub late_results: usize,
    /// Progress snapshots emitted while searching
    pub snapshots: u64,
}

/// A one-shot latch: only the first caller of [`FirstWins::try_claim`] wins.
#[derive(Debug, Default)]
pub struct FirstWins {
    claimed: AtomicBool,
}

impl FirstWins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the latch, returning `true` only for the first caller.
    #[inline]
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

/// Runs one search over a fresh pool of workers.
pub struct Coordinator {
    pattern: Arc<SearchPattern>,
    options: SearchOptions,
    source: Arc<dyn KeypairSource>,
    shutdown: Option<Arc<AtomicBool>>,
}

impl Coordinator {
    /// Creates a coordinator using ed25519 keypairs.
    ///
    /// Fails before anything is spawned if the options are invalid.
    pub fn new(pattern: SearchPattern, options: SearchOptions) -> Result<Self, ConfigError> {
        options.validate()?;

        Ok(Self {
            pattern: Arc::new(pattern),
            options,
            source: Arc::new(Ed25519Source),
            shutdown: None,
        })
    }

    /// Replaces the keypair source.
    pub fn with_source(mut self, source: impl KeypairSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    /// Observes `shutdown`; once it is set the search resolves as cancelled.
    pub fn with_shutdown(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn pattern(&self) -> &SearchPattern {
        &self.pattern
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Runs the search to completion.
    ///
    /// Blocks until an outcome is decided, then stops and joins every worker
    /// before returning.
    pub fn run(&self) -> SearchReport {
        let started = Instant::now();
        let timeout = self.options.timeout;

        if self.pattern.is_unconstrained() {
            warn!("empty pattern never matches; search can only time out or exhaust");
        }
        info!(
            pattern = %self.pattern,
            workers = self.options.cores,
            timeout_secs = timeout.as_secs(),
            difficulty = %self.pattern.difficulty_description(),
            "starting search"
        );

        let (events_tx, events_rx) = unbounded();
        let mut pool = WorkerPool::spawn(
            self.options.cores,
            self.pattern.clone(),
            self.source.clone(),
            events_tx,
            self.options.batch_size,
        );

        let deadline = after(timeout);
        let ticker = tick(self.options.report_interval);
        let mut progress = Progress::new(started);
        let latch = FirstWins::new();
        let mut snapshots = 0u64;

        let outcome = loop {
            let resolved = if self.shutdown_requested() {
                Some(SearchOutcome::Cancelled)
            } else if pool.live() == 0 {
                Some(SearchOutcome::Exhausted {
                    workers: pool.num_workers(),
                })
            } else {
                select! {
                    recv(events_rx) -> event => match event {
                        Ok(WorkerEvent::Progress { attempts, .. }) => {
                            progress.record(attempts);
                            None
                        }
                        Ok(WorkerEvent::Found { worker_id, result }) => {
                            info!(worker_id, public_id = %result.public_id, "result found, terminating workers");
                            Some(SearchOutcome::Found(result))
                        }
                        Ok(WorkerEvent::Exited { worker_id, fault }) => {
                            pool.mark_exited(worker_id);
                            if let Some(fault) = fault {
                                warn!(worker_id, %fault, live = pool.live(), "worker exited abnormally");
                            }
                            None
                        }
                        Err(_) => Some(SearchOutcome::Exhausted {
                            workers: pool.num_workers(),
                        }),
                    },
                    recv(ticker) -> _ => {
                        let snapshot = progress.snapshot();
                        snapshots += 1;
                        info!(
                            elapsed_secs = snapshot.elapsed.as_secs(),
                            attempts = snapshot.total_attempts,
                            rate = snapshot.attempts_per_second as u64,
                            "{}", snapshot
                        );
                        None
                    },
                    recv(deadline) -> _ => Some(SearchOutcome::TimedOut(timeout)),
                }
            };

            if let Some(outcome) = resolved.filter(|_| latch.try_claim()) {
                break outcome;
            }
        };

        let live_workers = pool.live();
        pool.join();

        let mut late_results = 0;
        for event in events_rx.try_iter() {
            match event {
                WorkerEvent::Progress { attempts, .. } => progress.record(attempts),
                WorkerEvent::Found { worker_id, .. } => {
                    late_results += 1;
                    debug!(worker_id, "ignoring result that arrived after resolution")
                }
                WorkerEvent::Exited { .. } => {}
            }
        }

        let report = SearchReport {
            outcome,
            attempts: progress.total_attempts(),
            elapsed: started.elapsed(),
            live_workers,
            late_results,
            snapshots,
        };
        log_outcome(&report);
        report
    }
}

fn log_outcome(report: &SearchReport) {
    let elapsed_secs = report.elapsed.as_secs_f64();
    match &report.outcome {
        SearchOutcome::Found(result) => info!(
            public_id = %result.public_id,
            attempts = report.attempts,
            elapsed_secs,
            "search finished"
        ),
        SearchOutcome::TimedOut(timeout) => warn!(
            timeout_secs = timeout.as_secs(),
            attempts = report.attempts,
            "search timed out, workers terminated"
        ),
        SearchOutcome::Exhausted { workers } => error!(
            workers,
            attempts = report.attempts,
            "all workers exited without finding a result"
        ),
        SearchOutcome::Cancelled => info!(
            attempts = report.attempts,
            elapsed_secs,
            "search cancelled"
        ),
    }
}

/// Searches for a keypair matching `pattern`.
///
/// Returns the keypair, or an error if the search timed out, exhausted its
/// workers or was given invalid options.
pub fn search(pattern: SearchPattern, options: SearchOptions) -> Result<KeypairResult, SearchError> {
    Coordinator::new(pattern, options)?.run().outcome.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Keypair, SourceError};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;

    struct FixedSource(&'static str);

    impl KeypairSource for FixedSource {
        fn generate(&self) -> Result<Keypair, SourceError> {
            Ok(Keypair::from_parts(self.0, [1u8; 64]))
        }
    }

    struct BrokenSource;

    impl KeypairSource for BrokenSource {
        fn generate(&self) -> Result<Keypair, SourceError> {
            Err(SourceError::Unavailable("rng offline".into()))
        }
    }

    struct PanickingSource;

    impl KeypairSource for PanickingSource {
        fn generate(&self) -> Result<Keypair, SourceError> {
            panic!("generator crashed")
        }
    }

    fn options(timeout_secs: u64, cores: usize) -> SearchOptions {
        SearchOptions {
            batch_size: 1_000,
            ..SearchOptions::new(Duration::from_secs(timeout_secs), cores)
        }
    }

    #[test]
    fn test_finds_prefix_with_real_keys() {
        let pattern = SearchPattern::prefix("AB").unwrap();
        let report = Coordinator::new(pattern, SearchOptions::new(Duration::from_secs(600), 4))
            .unwrap()
            .run();

        let result = match report.outcome {
            SearchOutcome::Found(result) => result,
            other => panic!("expected a match, got {:?}", other),
        };
        assert!(result.public_id.starts_with("AB"));

        // The private material must regenerate the same public key.
        let secret = bs58::decode(&result.private_material).into_vec().unwrap();
        let seed: [u8; 32] = secret[..32].try_into().unwrap();
        assert_eq!(Keypair::from_seed(seed).public_id(), result.public_id);
    }

    #[test]
    fn test_times_out_when_nothing_matches() {
        let pattern = SearchPattern::suffix("pump").unwrap();
        let report = Coordinator::new(pattern, options(1, 1))
            .unwrap()
            .with_source(FixedSource("1111"))
            .run();

        assert_eq!(report.outcome, SearchOutcome::TimedOut(Duration::from_secs(1)));
        assert!(report.elapsed >= Duration::from_secs(1));
        assert!(report.elapsed < Duration::from_secs(10));
        assert!(report.attempts > 0);
    }

    #[test]
    fn test_exhausted_when_every_worker_faults() {
        let pattern = SearchPattern::suffix("pump").unwrap();
        let report = Coordinator::new(pattern, options(600, 3))
            .unwrap()
            .with_source(BrokenSource)
            .run();

        assert_eq!(report.outcome, SearchOutcome::Exhausted { workers: 3 });
        assert_eq!(report.live_workers, 0);
        assert!(report.elapsed < Duration::from_secs(60));
    }

    #[test]
    fn test_exhausted_when_every_worker_panics() {
        let pattern = SearchPattern::prefix("AB").unwrap();
        let report = Coordinator::new(pattern, options(600, 2))
            .unwrap()
            .with_source(PanickingSource)
            .run();

        assert_eq!(report.outcome, SearchOutcome::Exhausted { workers: 2 });
        assert_eq!(report.live_workers, 0);
    }

    #[test]
    fn test_empty_pattern_never_finds() {
        let pattern = SearchPattern::new("", "").unwrap();
        let report = Coordinator::new(pattern, options(1, 2))
            .unwrap()
            .with_source(FixedSource("ABpump"))
            .run();

        assert!(!report.outcome.is_found());
        assert_eq!(report.outcome, SearchOutcome::TimedOut(Duration::from_secs(1)));
    }

    /// Holds every caller until all workers are generating, then matches.
    struct GatedSource {
        gate: Barrier,
        calls: Arc<AtomicUsize>,
    }

    impl KeypairSource for GatedSource {
        fn generate(&self) -> Result<Keypair, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.wait();
            Ok(Keypair::from_parts("XYZpump", [1u8; 64]))
        }
    }

    #[test]
    fn test_simultaneous_matches_resolve_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = GatedSource {
            gate: Barrier::new(8),
            calls: calls.clone(),
        };

        let pattern = SearchPattern::new("AB", "pump").unwrap();
        let report = Coordinator::new(pattern, options(600, 8))
            .unwrap()
            .with_source(source)
            .run();

        match report.outcome {
            SearchOutcome::Found(result) => assert_eq!(result.public_id, "XYZpump"),
            other => panic!("expected a match, got {:?}", other),
        }
        // Every worker matched; one result won and the other seven were dropped.
        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert_eq!(report.late_results, 7);
    }

    #[test]
    fn test_snapshots_follow_report_interval() {
        let options = SearchOptions {
            report_interval: Duration::from_millis(100),
            ..options(1, 2)
        };
        let report = Coordinator::new(SearchPattern::suffix("pump").unwrap(), options)
            .unwrap()
            .with_source(FixedSource("1111"))
            .run();

        assert_eq!(report.outcome, SearchOutcome::TimedOut(Duration::from_secs(1)));
        assert!(report.snapshots >= 5, "only {} snapshots", report.snapshots);
        assert!(report.attempts >= 1_000);
        assert_eq!(report.attempts % 1_000, 0);
        assert_eq!(report.late_results, 0);
    }

    #[test]
    fn test_shutdown_cancels_search() {
        let pattern = SearchPattern::suffix("pump").unwrap();
        let shutdown = Arc::new(AtomicBool::new(true));
        let report = Coordinator::new(pattern, options(600, 2))
            .unwrap()
            .with_source(FixedSource("1111"))
            .with_shutdown(shutdown)
            .run();

        assert_eq!(report.outcome, SearchOutcome::Cancelled);
        assert!(matches!(
            report.outcome.into_result(),
            Err(SearchError::Cancelled)
        ));
    }

    #[test]
    fn test_shutdown_during_search() {
        let pattern = SearchPattern::suffix("pump").unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let coordinator = Coordinator::new(pattern, options(600, 2))
            .unwrap()
            .with_source(FixedSource("1111"))
            .with_shutdown(shutdown.clone());

        let handle = thread::spawn(move || coordinator.run());
        thread::sleep(Duration::from_millis(200));
        shutdown.store(true, Ordering::Relaxed);

        let report = handle.join().unwrap();
        assert_eq!(report.outcome, SearchOutcome::Cancelled);
    }

    #[test]
    fn test_first_wins_under_contention() {
        let latch = Arc::new(FirstWins::new());
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let latch = latch.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    latch.try_claim()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(wins, 1);
        assert!(latch.is_claimed());
        assert!(!latch.try_claim());
    }

    #[test]
    fn test_rejects_invalid_options() {
        let pattern = SearchPattern::prefix("AB").unwrap();
        assert!(Coordinator::new(pattern.clone(), SearchOptions::new(Duration::from_secs(10), 0)).is_err());
        assert!(Coordinator::new(pattern.clone(), SearchOptions::new(Duration::ZERO, 2)).is_err());

        let err = search(pattern, SearchOptions { batch_size: 0, ..SearchOptions::default() })
            .unwrap_err();
        assert!(matches!(err, SearchError::Config(ConfigError::InvalidOption(_))));
    }

    #[test]
    fn test_search_reports_timeout_as_error() {
        let err = search(SearchPattern::default(), options(1, 1)).unwrap_err();
        assert!(matches!(err, SearchError::TimedOut(t) if t == Duration::from_secs(1)));
        assert_eq!(err.to_string(), "Keypair generation timed out after 1 seconds");
    }

    #[test]
    fn test_default_cores_is_positive() {
        assert!(default_cores() >= 1);
        assert_eq!(SearchOptions::default().batch_size, 10_000);
    }
}
