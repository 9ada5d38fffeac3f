//! Application configuration loaded from environment variables.

use serde::Deserialize;
use strum::{Display, EnumString};

/// Gamma market-data API base URL.
pub const GAMMA_API_BASE: &str = "https://gamma-api.polymarket.com";

/// CLOB price API base URL.
pub const CLOB_API_BASE: &str = "https://clob.polymarket.com";

/// Google Sheets API base URL.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// Where finished rows are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SinkKind {
    /// Append to a Google Sheet.
    #[default]
    Sheets,
    /// Print one JSON object per row.
    Stdout,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Polymarket ===
    /// Market slug to track (preferred over the event slug).
    #[serde(default)]
    pub polymarket_market_slug: Option<String>,

    /// Event slug to track when no market slug is set.
    #[serde(default)]
    pub polymarket_event_slug: Option<String>,

    /// Gamma API base URL.
    #[serde(default = "default_gamma_url")]
    pub polymarket_gamma_api_base: String,

    /// CLOB API base URL.
    #[serde(default = "default_clob_url")]
    pub polymarket_clob_api_base: String,

    // === Google Sheets ===
    /// Target spreadsheet id.
    #[serde(default)]
    pub google_sheet_id: Option<String>,

    /// Tab name inside the spreadsheet.
    #[serde(default = "default_sheet_name")]
    pub google_sheet_name: String,

    /// OAuth bearer token with the spreadsheets scope.
    #[serde(default)]
    pub google_sheets_access_token: Option<String>,

    /// Sheets API base URL.
    #[serde(default = "default_sheets_url")]
    pub google_sheets_api_base: String,

    /// Row destination.
    #[serde(default)]
    pub row_sink: SinkKind,

    // === Scheduling ===
    /// Minutes between poll cycles.
    #[serde(default = "default_interval")]
    pub update_interval_minutes: u64,

    // === HTTP ===
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    /// Idle connections kept per host.
    #[serde(default = "default_pool_size")]
    pub http_pool_size: usize,

    // === Server / logging ===
    /// HTTP server port for health/metrics endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit JSON log lines.
    #[serde(default)]
    pub log_json: bool,

    /// Also write logs to this file.
    #[serde(default)]
    pub log_file: Option<String>,
}

fn default_gamma_url() -> String {
    GAMMA_API_BASE.to_string()
}

fn default_clob_url() -> String {
    CLOB_API_BASE.to_string()
}

fn default_sheets_url() -> String {
    SHEETS_API_BASE.to_string()
}

fn default_sheet_name() -> String {
    "Polymarket Prices".to_string()
}

fn default_interval() -> u64 {
    10
}

fn default_http_timeout() -> u64 {
    30_000
}

fn default_pool_size() -> usize {
    4
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Treat empty or whitespace-only values as unset.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            polymarket_market_slug: None,
            polymarket_event_slug: None,
            polymarket_gamma_api_base: default_gamma_url(),
            polymarket_clob_api_base: default_clob_url(),
            google_sheet_id: None,
            google_sheet_name: default_sheet_name(),
            google_sheets_access_token: None,
            google_sheets_api_base: default_sheets_url(),
            row_sink: SinkKind::default(),
            update_interval_minutes: default_interval(),
            http_timeout_ms: default_http_timeout(),
            http_pool_size: default_pool_size(),
            port: default_port(),
            rust_log: default_log_level(),
            log_json: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        let mut missing = Vec::new();

        if self.tracked_slug().is_none() {
            missing.push("POLYMARKET_EVENT_SLUG or POLYMARKET_MARKET_SLUG");
        }

        if self.row_sink == SinkKind::Sheets {
            if self.sheet_id().is_none() {
                missing.push("GOOGLE_SHEET_ID");
            }
            if self.access_token().is_none() {
                missing.push("GOOGLE_SHEETS_ACCESS_TOKEN");
            }
        }

        if !missing.is_empty() {
            return Err(format!(
                "missing required configuration: {}",
                missing.join(", ")
            ));
        }

        if self.update_interval_minutes == 0 {
            return Err("UPDATE_INTERVAL_MINUTES must be at least 1".to_string());
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be positive".to_string());
        }

        Ok(())
    }

    /// Configured market slug, if any.
    pub fn market_slug(&self) -> Option<&str> {
        non_empty(&self.polymarket_market_slug)
    }

    /// Configured event slug, if any.
    pub fn event_slug(&self) -> Option<&str> {
        non_empty(&self.polymarket_event_slug)
    }

    /// The identifier polled each cycle: market slug, else event slug.
    pub fn tracked_slug(&self) -> Option<&str> {
        self.market_slug().or_else(|| self.event_slug())
    }

    /// Spreadsheet id, if set.
    pub fn sheet_id(&self) -> Option<&str> {
        non_empty(&self.google_sheet_id)
    }

    /// Sheets bearer token, if set.
    pub fn access_token(&self) -> Option<&str> {
        non_empty(&self.google_sheets_access_token)
    }

    /// Poll interval as a duration.
    pub fn update_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.update_interval_minutes * 60)
    }
}
