//! Row sink seam and the non-Sheets sinks.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::SheetsError;
use crate::row::PriceRow;

/// Destination for finished rows.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Persist one row.
    async fn write_row(&self, row: &PriceRow) -> Result<(), SheetsError>;

    /// Timestamp of the most recently written row, if the sink tracks it.
    async fn last_update_time(&self) -> Result<Option<OffsetDateTime>, SheetsError>;
}

/// Prints each row as one JSON object on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

#[async_trait]
impl RowSink for StdoutSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn write_row(&self, row: &PriceRow) -> Result<(), SheetsError> {
        let mut out = std::io::stdout().lock();
        serde_json::to_writer(&mut out, row).map_err(std::io::Error::from)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }

    async fn last_update_time(&self) -> Result<Option<OffsetDateTime>, SheetsError> {
        Ok(None)
    }
}

/// Keeps rows in memory, for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    rows: Arc<Mutex<Vec<PriceRow>>>,
    fail: Arc<Mutex<bool>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows written so far.
    pub fn rows(&self) -> Vec<PriceRow> {
        self.rows.lock().unwrap().clone()
    }

    /// Make writes fail.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl RowSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn write_row(&self, row: &PriceRow) -> Result<(), SheetsError> {
        if *self.fail.lock().unwrap() {
            return Err(SheetsError::HttpStatus {
                range: "memory".to_string(),
                status: 500,
                body: "mock write failure".to_string(),
            });
        }
        self.rows.lock().unwrap().push(row.clone());
        debug!(rows = self.rows.lock().unwrap().len(), "Stored row in memory");
        Ok(())
    }

    async fn last_update_time(&self) -> Result<Option<OffsetDateTime>, SheetsError> {
        Ok(self.rows.lock().unwrap().last().map(|row| row.timestamp))
    }
}
