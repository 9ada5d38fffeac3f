//! Read-only API seams and the shared HTTP session.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::MarketError;
use crate::metrics;

use super::types::{ClobMarketsPage, Event, Market};

/// Market-data reads (Gamma API).
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// Markets matching a slug. Expected to hold zero or one entry.
    async fn markets_by_slug(&self, slug: &str) -> Result<Vec<Market>, MarketError>;

    /// Events matching a slug.
    async fn events_by_slug(&self, slug: &str) -> Result<Vec<Event>, MarketError>;

    /// Markets belonging to an event, in upstream order.
    async fn markets_for_event(&self, event_slug: &str) -> Result<Vec<Market>, MarketError>;
}

/// Price reads (CLOB API).
#[async_trait]
pub trait PriceDataApi: Send + Sync {
    /// First page of the market listing.
    async fn list_markets(&self) -> Result<ClobMarketsPage, MarketError>;
}

/// Build the pooled HTTP client shared by every API client.
pub fn build_http_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(config.http_timeout_ms))
        .connect_timeout(Duration::from_secs(5))
        .tcp_keepalive(Duration::from_secs(30))
        .pool_max_idle_per_host(config.http_pool_size)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// GET `url` with query parameters and decode a JSON body.
///
/// `label` names the endpoint in metrics.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
    label: &'static str,
) -> Result<T, MarketError> {
    let start = Instant::now();

    let response = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| MarketError::Transport {
            endpoint: url.to_string(),
            source,
        })?;

    metrics::record_http_latency(start, label);

    let status = response.status();
    if !status.is_success() {
        return Err(MarketError::HttpStatus {
            endpoint: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| MarketError::Transport {
            endpoint: url.to_string(),
            source,
        })?;

    debug!(endpoint = %url, bytes = body.len(), "Received response");

    serde_json::from_slice(&body).map_err(|e| MarketError::Parse {
        endpoint: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_client_builds_from_default_config() {
        let config = Config::default();
        assert!(build_http_client(&config).is_ok());
    }
}
