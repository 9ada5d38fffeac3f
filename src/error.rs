//! Unified error types for the price agent.

use thiserror::Error;

/// Unified error type for the price agent.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration was loaded but is not usable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Market or price lookup error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Row sink error.
    #[error("sheets error: {0}")]
    Sheets(#[from] SheetsError),

    /// HTTP client construction error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Market and price lookup errors.
///
/// `NotFound` is the only recoverable variant: the slug or condition id has
/// no upstream record. Everything else means the service could not be asked.
#[derive(Error, Debug)]
pub enum MarketError {
    /// No market could be resolved for the identifier.
    #[error("no market found for {identifier}")]
    NotFound {
        /// The slug that failed to resolve.
        identifier: String,
    },

    /// Request never produced a response.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        /// Endpoint URL that was called.
        endpoint: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    HttpStatus {
        /// Endpoint URL that was called.
        endpoint: String,
        /// Status code returned.
        status: u16,
    },

    /// Response body could not be decoded.
    #[error("failed to parse response from {endpoint}: {reason}")]
    Parse {
        /// Endpoint URL that was called.
        endpoint: String,
        /// Decoder message.
        reason: String,
    },
}

impl MarketError {
    /// Whether this is the recoverable "no such record" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MarketError::NotFound { .. })
    }
}

/// Spreadsheet write errors.
#[derive(Error, Debug)]
pub enum SheetsError {
    /// Request never produced a response.
    #[error("sheets request to {range} failed: {source}")]
    Transport {
        /// A1 range that was addressed.
        range: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Sheets API answered with a non-success status.
    #[error("sheets API returned HTTP {status} for {range}: {body}")]
    HttpStatus {
        /// A1 range that was addressed.
        range: String,
        /// Status code returned.
        status: u16,
        /// Response body, for diagnosis.
        body: String,
    },

    /// Response body could not be decoded.
    #[error("failed to parse sheets response for {range}: {reason}")]
    Parse {
        /// A1 range that was addressed.
        range: String,
        /// Decoder message.
        reason: String,
    },

    /// Writing to a local stream failed.
    #[error("failed to write row: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_recoverable() {
        let err = MarketError::NotFound {
            identifier: "some-slug".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no market found for some-slug");
    }

    #[test]
    fn status_errors_are_not_not_found() {
        let err = MarketError::HttpStatus {
            endpoint: "https://gamma-api.polymarket.com/markets".to_string(),
            status: 503,
        };
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn market_error_converts_into_agent_error() {
        let err: AgentError = MarketError::NotFound {
            identifier: "x".to_string(),
        }
        .into();
        assert!(matches!(err, AgentError::Market(_)));
    }
}
