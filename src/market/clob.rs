//! CLOB API client for the market price listing.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::client::{get_json, PriceDataApi};
use super::types::ClobMarketsPage;
use crate::error::MarketError;

/// Client for Polymarket's CLOB API.
#[derive(Debug, Clone)]
pub struct ClobClient {
    http: reqwest::Client,
    base_url: String,
}

impl ClobClient {
    /// Create a client over a shared HTTP session.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// CLOB base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PriceDataApi for ClobClient {
    #[instrument(skip(self))]
    async fn list_markets(&self) -> Result<ClobMarketsPage, MarketError> {
        let url = format!("{}/markets", self.base_url);
        let page: ClobMarketsPage = get_json(&self.http, &url, &[], "clob_markets").await?;
        debug!(count = page.data.len(), "Fetched CLOB market listing");
        Ok(page)
    }
}
