//! Append-only JSON-lines keypair file.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{KeypairRecord, KeypairSink, SinkError};

/// Stores one JSON document per line.
pub struct JsonlSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    /// Public keys already present in the file
    known: HashSet<String>,
}

impl JsonlSink {
    /// Opens (or creates) the file at `path`, loading the keys it already holds.
    ///
    /// An unterminated last line that does not parse is the remains of an
    /// interrupted write; it is cut off with a warning. Any other unparsable
    /// line is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let mut known = HashSet::new();
        let mut needs_newline = false;

        if path.exists() {
            let mut reader = BufReader::new(File::open(&path)?);
            let mut line = String::new();
            let mut valid_len = 0u64;

            loop {
                line.clear();
                let read = reader.read_line(&mut line)?;
                if read == 0 {
                    break;
                }
                let terminated = line.ends_with('\n');

                if !line.trim().is_empty() {
                    match serde_json::from_str::<KeypairRecord>(line.trim_end()) {
                        Ok(record) => {
                            known.insert(record.public_key);
                        }
                        Err(e) if !terminated => {
                            warn!(
                                path = %path.display(),
                                offset = valid_len,
                                error = %e,
                                "discarding torn trailing record"
                            );
                            OpenOptions::new().write(true).open(&path)?.set_len(valid_len)?;
                            break;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }

                valid_len += read as u64;
                needs_newline = !terminated;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);
        if needs_newline {
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        info!(path = %path.display(), existing = known.len(), "opened keypair store");

        Ok(Self {
            path,
            writer: Some(writer),
            known,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of keypairs in the store.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn contains(&self, public_key: &str) -> bool {
        self.known.contains(public_key)
    }
}

impl KeypairSink for JsonlSink {
    fn persist(&mut self, record: &KeypairRecord) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;

        if self.known.contains(&record.public_key) {
            return Err(SinkError::Duplicate(record.public_key.clone()));
        }

        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        self.known.insert(record.public_key.clone());
        debug!(public_key = %record.public_key, "keypair persisted");
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            info!(path = %self.path.display(), "keypair store closed");
        }
        Ok(())
    }
}
