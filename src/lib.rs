//! Polymarket price poller that appends one flat row per poll to a Google Sheet.
//!
//! Every cycle resolves a configured market or event slug against the Gamma
//! API, looks the market up in the CLOB listing, and writes a row of
//! metadata plus one `{outcome}_price` column per outcome.
//!
//! ```text
//! slug ──► Gamma /markets?slug=        ──► Market
//!      └─► Gamma /events?slug= + first market
//! Market.condition_id ──► CLOB /markets ──► outcome prices (or "N/A")
//! Market + prices ──► PriceRow ──► RowSink (Google Sheets | stdout)
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Gamma/CLOB clients, slug resolution and price lookup
//! - [`row`]: Row normalization
//! - [`sheets`]: Row sinks (Google Sheets, stdout)
//! - [`agent`]: Poll scheduler
//! - [`api`]: HTTP API for health/status/metrics
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod market;
pub mod metrics;
pub mod row;
pub mod sheets;
pub mod utils;

pub use agent::PriceAgent;
pub use config::Config;
pub use error::{AgentError, Result};
