//! Row sinks: Google Sheets, stdout, and an in-memory sink for tests.

pub mod client;
pub mod sink;

pub use client::{
    check_headers, last_timestamp, parse_timestamp, GoogleSheetsClient, HeaderCheck, ValueRange,
};
pub use sink::{MemorySink, RowSink, StdoutSink};
