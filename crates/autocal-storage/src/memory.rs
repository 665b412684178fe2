//! In-memory transcript.

use anyhow::{bail, Result};
use async_trait::async_trait;
use autocal_core::{LogEntry, ResultSink, SampleRecord};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Transcript {
    entries: Vec<LogEntry>,
    closed: bool,
}

/// Transcript kept in memory.
///
/// Clones share the same transcript, so a test can keep a handle while the
/// sweep owns the sink.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Transcript>>,
}

impl MemorySink {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries appended so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.lock().entries.clone()
    }

    /// Sample records only, in order.
    pub fn samples(&self) -> Vec<SampleRecord> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Sample(record) => Some(*record),
                _ => None,
            })
            .collect()
    }

    /// Whether the sink has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let mut transcript = self.inner.lock();
        if transcript.closed {
            bail!("Transcript is closed");
        }
        transcript.entries.push(entry.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.lock().closed = true;
        Ok(())
    }

    async fn transcript(&self) -> Result<String> {
        let transcript = self.inner.lock();
        Ok(transcript
            .entries
            .iter()
            .map(|entry| format!("{}\n", entry))
            .collect())
    }
}
