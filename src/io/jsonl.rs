use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use super::EventSink;
use crate::core::Event;

/// Writes each event as one JSON record per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<BufWriter<W>>,
}

impl JsonLinesSink<std::fs::File> {
    /// Append to the file at `path`, creating it if needed
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening event output {}", path.display()))?;
        log::info!("Writing events to {}", path.display());
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        let writer = self.writer.into_inner().unwrap_or_else(|p| p.into_inner());
        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing event output: {}", e.error()))
    }
}

#[async_trait]
impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    async fn write_event(&self, event: &Event) -> Result<()> {
        let line = serde_json::to_string(event)?;
        let mut writer = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        writeln!(writer, "{}", line)?;
        Ok(())
    }
}
