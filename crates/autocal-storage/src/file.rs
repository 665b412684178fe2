//! Plain-text transcript file.

use anyhow::{Context, Result};
use async_trait::async_trait;
use autocal_core::{LogEntry, ResultSink};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Transcript written line by line to a file.
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    lines: usize,
}

impl FileSink {
    /// Create (or truncate) the transcript at `path`.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .await
            .with_context(|| format!("Failed to create transcript {}", path.display()))?;
        tracing::info!(path = %path.display(), "Opened result transcript");
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            lines: 0,
        })
    }

    /// Location of the transcript.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines appended so far.
    pub fn lines_written(&self) -> usize {
        self.lines
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .with_context(|| format!("Transcript {} is closed", self.path.display()))?;
        let line = format!("{}\n", entry);
        writer
            .write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        self.lines += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .await
                .with_context(|| format!("Failed to flush {}", self.path.display()))?;
            writer.into_inner().sync_all().await?;
            tracing::info!(path = %self.path.display(), lines = self.lines, "Closed result transcript");
        }
        Ok(())
    }

    async fn transcript(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read back {}", self.path.display()))
    }
}
