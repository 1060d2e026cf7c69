//! Persistence of found keypairs.

mod jsonl;

pub use jsonl::JsonlSink;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::KeypairResult;
use crate::matcher::SearchPattern;

/// Errors raised by a sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Public key {0} is already stored")]
    Duplicate(String),

    #[error("Sink is closed")]
    Closed,
}

/// A stored keypair document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeypairRecord {
    pub public_key: String,
    pub private_key: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl KeypairRecord {
    /// Builds an inactive record for a freshly found keypair.
    pub fn new(result: &KeypairResult, pattern: &SearchPattern) -> Self {
        Self {
            public_key: result.public_id.clone(),
            private_key: result.private_material.clone(),
            is_active: false,
            created_at: Utc::now(),
            prefix: pattern.prefix_str().map(str::to_owned),
            suffix: pattern.suffix_str().map(str::to_owned),
        }
    }
}

/// Durable storage for found keypairs, keyed by public key.
///
/// Failures are returned to the caller; sinks never retry.
pub trait KeypairSink {
    /// Records one keypair.
    fn persist(&mut self, record: &KeypairRecord) -> Result<(), SinkError>;

    /// Flushes and releases the underlying storage.
    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
