//! Durable record of every generation request.
//!
//! This is separate from the `tracing` output: it is an append-only store of
//! who asked for what, kept in a flat text file by default.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Context;
use chrono::{DateTime, Local};

const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone)]
pub struct UsageRecord {
    pub timestamp: DateTime<Local>,
    pub speaker_count: usize,
    pub voices: Vec<String>,
    pub script: String,
}

impl UsageRecord {
    pub fn new(script: &str, speaker_count: usize, voices: &[&str]) -> Self {
        Self {
            timestamp: Local::now(),
            speaker_count,
            voices: voices.iter().map(|v| v.to_string()).collect(),
            script: script.to_string(),
        }
    }

    /// Script length in characters (not bytes).
    pub fn script_chars(&self) -> usize {
        self.script.chars().count()
    }

    /// Render the record as one self-contained text block.
    pub fn to_block(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!(
            "\n{rule}\nTimestamp: {}\nSpeakers: {}\nVoices: {}\nScript Length: {} characters\nScript:\n{}\n{rule}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.speaker_count,
            self.voices.join(", "),
            self.script_chars(),
            self.script,
        )
    }
}

/// Sink for usage records. Implementations must serialize concurrent writers.
pub trait UsageLog: Send + Sync {
    fn record(&self, record: &UsageRecord) -> anyhow::Result<()>;
}

/// Appends records to a text file, one block per request.
#[derive(Debug)]
pub struct FileUsageLog {
    path: PathBuf,
    // held for the duration of each append so blocks never interleave
    write_lock: Mutex<()>,
}

impl FileUsageLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UsageLog for FileUsageLog {
    /// Blocking append. Async callers go through `spawn_blocking`.
    fn record(&self, record: &UsageRecord) -> anyhow::Result<()> {
        let block = record.to_block();
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("usage log lock poisoned"))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open usage log {}", self.path.display()))?;
        file.write_all(block.as_bytes())
            .with_context(|| format!("Failed to append to usage log {}", self.path.display()))?;
        Ok(())
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUsageLog;

impl UsageLog for NoopUsageLog {
    fn record(&self, _record: &UsageRecord) -> anyhow::Result<()> {
        Ok(())
    }
}
