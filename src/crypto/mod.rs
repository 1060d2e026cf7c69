//! Keypair generation for Solana-style ed25519 identities.
//!
//! This module provides:
//! - Secure random key generation using ed25519
//! - Base58 encoding of the public identifier and private material
//! - The `KeypairSource` seam the workers draw candidates from

mod keypair;
mod source;

pub use keypair::{Keypair, KeypairResult, KEYPAIR_LENGTH};
pub use source::{Ed25519Source, KeypairSource, SourceError};
