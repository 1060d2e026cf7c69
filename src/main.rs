//! Solana Vanity Keypair Generator
//!
//! Searches for keypairs whose public key starts with a prefix or ends with
//! a suffix, appending each one found to a JSON-lines file.
//!
//! Usage:
//!   sol_vanity -s pump                # Keypairs ending with "pump", forever
//!   sol_vanity -p AB -s "" -n 5       # Five keypairs starting with "AB"
//!   VANITY_SUFFIX=pump VANITY_CORES=8 sol_vanity

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sol_vanity::{
    Config, Coordinator, JsonlSink, KeypairRecord, KeypairSink, SearchError, SearchPattern,
};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::parse();

    // Validate configuration
    let pattern = match config.validate() {
        Ok(pattern) => pattern,
        Err(e) => {
            error!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let mut sink = match JsonlSink::open(&config.output) {
        Ok(sink) => sink,
        Err(e) => {
            error!(path = %config.output.display(), "Failed to open keypair store: {}", e);
            process::exit(1);
        }
    };

    // SIGINT / SIGTERM
    let shutdown = Arc::new(AtomicBool::new(false));
    if let Err(e) = shutdown_handler(shutdown.clone()) {
        error!("Error setting signal handler: {}", e);
        process::exit(1);
    }

    info!(
        pattern = %pattern,
        difficulty = %pattern.difficulty_description(),
        workers = config.worker_count(),
        target = config.count,
        output = %config.output.display(),
        "Solana vanity keypair generator started"
    );

    let stored = run_generator_loop(&config, &pattern, &mut sink, &shutdown);

    if let Err(e) = sink.close() {
        error!("Failed to close keypair store: {}", e);
        process::exit(1);
    }
    info!(stored, "Shut down");
}

/// Searches and persists keypairs until the target count or a shutdown.
///
/// Returns the number of keypairs stored.
fn run_generator_loop(
    config: &Config,
    pattern: &SearchPattern,
    sink: &mut impl KeypairSink,
    shutdown: &Arc<AtomicBool>,
) -> usize {
    let mut stored = 0;
    let mut attempt = 0usize;

    while !shutdown.load(Ordering::Relaxed) {
        if config.count > 0 && stored >= config.count {
            info!("Target reached! Stored {} keypair(s).", stored);
            break;
        }

        attempt += 1;
        info!(attempt, "Generating address");

        let coordinator = match Coordinator::new(pattern.clone(), config.search_options()) {
            Ok(coordinator) => coordinator.with_shutdown(shutdown.clone()),
            Err(e) => {
                error!("Configuration error: {}", e);
                break;
            }
        };

        match coordinator.run().outcome.into_result() {
            Ok(result) => {
                info!(attempt, public_key = %result.public_id, "Address generated");
                match sink.persist(&KeypairRecord::new(&result, pattern)) {
                    Ok(()) => stored += 1,
                    Err(e) => error!(attempt, "Error saving keypair: {}", e),
                }
            }
            Err(SearchError::Cancelled) => break,
            Err(e @ SearchError::Exhausted { .. }) => error!(attempt, "Error generating address: {}", e),
            Err(e) => warn!(attempt, "Error generating address: {}", e),
        }
    }

    stored
}

fn shutdown_handler(shutdown: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        if !shutdown.swap(true, Ordering::Relaxed) {
            info!("Received shutdown signal, stopping...");
        }
    })
}
