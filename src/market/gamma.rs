//! Gamma API client for market and event lookup.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::client::{get_json, MarketDataApi};
use super::types::{Event, Market};
use crate::error::MarketError;

/// Client for Polymarket's Gamma API.
#[derive(Debug, Clone)]
pub struct GammaClient {
    http: reqwest::Client,
    base_url: String,
}

impl GammaClient {
    /// Create a client over a shared HTTP session.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Gamma base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn markets_url(&self) -> String {
        format!("{}/markets", self.base_url)
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }
}

#[async_trait]
impl MarketDataApi for GammaClient {
    #[instrument(skip(self))]
    async fn markets_by_slug(&self, slug: &str) -> Result<Vec<Market>, MarketError> {
        let markets: Vec<Market> =
            get_json(&self.http, &self.markets_url(), &[("slug", slug)], "gamma_markets").await?;
        debug!(count = markets.len(), "Fetched markets by slug");
        Ok(markets)
    }

    #[instrument(skip(self))]
    async fn events_by_slug(&self, slug: &str) -> Result<Vec<Event>, MarketError> {
        let events: Vec<Event> =
            get_json(&self.http, &self.events_url(), &[("slug", slug)], "gamma_events").await?;
        debug!(count = events.len(), "Fetched events by slug");
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn markets_for_event(&self, event_slug: &str) -> Result<Vec<Market>, MarketError> {
        let markets: Vec<Market> = get_json(
            &self.http,
            &self.markets_url(),
            &[("event_slug", event_slug)],
            "gamma_event_markets",
        )
        .await?;
        debug!(count = markets.len(), "Fetched markets for event");
        Ok(markets)
    }
}
