//! JSON Lines sink
//!
//! One post per line, appended and flushed immediately.

use crate::extract::Post;
use crate::sink::{AppendOutcome, Sink};
use crate::SinkError;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Appends posts to `.jsonl` files, optionally skipping records whose
/// `record_key` is already present in the destination
#[derive(Debug, Default)]
pub struct JsonlSink {
    deduplicate: bool,
    seen: HashMap<PathBuf, HashSet<String>>,
}

impl JsonlSink {
    pub fn new(deduplicate: bool) -> Self {
        Self {
            deduplicate,
            seen: HashMap::new(),
        }
    }

    /// Keys already recorded for `path`, loaded from disk on first use
    fn seen_keys(&mut self, path: &Path) -> Result<&mut HashSet<String>, SinkError> {
        if !self.seen.contains_key(path) {
            let keys = load_existing_keys(path)?;
            if !keys.is_empty() {
                tracing::info!(
                    file = %path.display(),
                    "Resuming output with {} existing records",
                    keys.len()
                );
            }
            self.seen.insert(path.to_path_buf(), keys);
        }
        Ok(self.seen.entry(path.to_path_buf()).or_default())
    }
}

impl Sink for JsonlSink {
    fn append(&mut self, path: &Path, post: &Post) -> Result<AppendOutcome, SinkError> {
        if self.deduplicate && self.seen_keys(path)?.contains(&post.record_key) {
            tracing::debug!(post_url = %post.url, "Skipping already persisted post");
            return Ok(AppendOutcome::Duplicate);
        }

        let line = serde_json::to_string(post)?;
        let io_err = |source: std::io::Error| SinkError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        writeln!(file, "{}", line).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.sync_data().map_err(io_err)?;

        if self.deduplicate {
            self.seen_keys(path)?.insert(post.record_key.clone());
        }
        Ok(AppendOutcome::Written)
    }

    fn contains(&mut self, path: &Path, key: &str) -> Result<bool, SinkError> {
        if !self.deduplicate {
            return Ok(false);
        }
        Ok(self.seen_keys(path)?.contains(key))
    }
}

/// Reads the `record_key` of every line of an existing output file
///
/// A missing file has no keys. Lines that do not parse are skipped.
fn load_existing_keys(path: &Path) -> Result<HashSet<String>, SinkError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(source) => {
            return Err(SinkError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let mut keys = HashSet::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| SinkError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&line) {
            Ok(record) => {
                if let Some(key) = record.get("record_key").and_then(Value::as_str) {
                    keys.insert(key.to_string());
                }
            }
            Err(e) => tracing::warn!(
                file = %path.display(),
                line = index + 1,
                "Ignoring unreadable output line: {}",
                e
            ),
        }
    }
    Ok(keys)
}
