//! # sol_vanity
//!
//! Parallel Solana vanity keypair generator.
//!
//! ## Architecture
//!
//! - `crypto`: Ed25519 keypair generation and base58 encoding
//! - `matcher`: Prefix/suffix pattern matching
//! - `worker`: Worker pool, search coordination and progress
//! - `store`: Persistence of found keypairs
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod store;
pub mod worker;

pub use config::{Config, ConfigError};
pub use crypto::{Ed25519Source, Keypair, KeypairResult, KeypairSource, SourceError};
pub use matcher::{MatchResult, PatternError, PatternType, SearchPattern};
pub use store::{JsonlSink, KeypairRecord, KeypairSink, SinkError};
pub use worker::{search, Coordinator, SearchError, SearchOptions, SearchOutcome, SearchReport};
