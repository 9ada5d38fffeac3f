//! Market resolution strategies.
//!
//! A slug is resolved by trying strategies in order; the first one that
//! yields a market wins. A strategy answering `Ok(None)` passes the slug on
//! to the next one. An error stops the chain, so an unreachable service is
//! never reported as a missing slug.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::MarketDataApi;
use super::types::Market;
use crate::error::MarketError;

/// One way of turning a slug into a market.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Resolve `slug`, or `Ok(None)` when this strategy finds nothing.
    async fn resolve(
        &self,
        api: &dyn MarketDataApi,
        slug: &str,
    ) -> Result<Option<Market>, MarketError>;
}

/// Treat the slug as a market slug.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByMarketSlug;

#[async_trait]
impl ResolveStrategy for ByMarketSlug {
    fn name(&self) -> &'static str {
        "market_slug"
    }

    async fn resolve(
        &self,
        api: &dyn MarketDataApi,
        slug: &str,
    ) -> Result<Option<Market>, MarketError> {
        let market = api.markets_by_slug(slug).await?.into_iter().next();
        if market.is_none() {
            warn!(slug, "No market found for slug");
        }
        Ok(market)
    }
}

/// Treat the slug as an event slug and take the event's first market.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMarketOfEvent;

#[async_trait]
impl ResolveStrategy for FirstMarketOfEvent {
    fn name(&self) -> &'static str {
        "event_slug"
    }

    async fn resolve(
        &self,
        api: &dyn MarketDataApi,
        slug: &str,
    ) -> Result<Option<Market>, MarketError> {
        if api.events_by_slug(slug).await?.is_empty() {
            warn!(slug, "No event found for slug");
            return Ok(None);
        }

        let markets = api.markets_for_event(slug).await?;
        let total = markets.len();
        let market = markets.into_iter().next();

        match &market {
            Some(_) => info!(slug, total, "Using first market from event"),
            None => warn!(slug, "Event has no markets"),
        }

        Ok(market)
    }
}

/// Ordered list of strategies.
pub struct Resolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.name()))
            .finish()
    }
}

impl Default for Resolver {
    /// Market slug first, then event slug.
    fn default() -> Self {
        Self::new()
            .with(ByMarketSlug)
            .with(FirstMarketOfEvent)
    }
}

impl Resolver {
    /// Empty resolver; always answers NotFound.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy to the end of the chain.
    pub fn with(mut self, strategy: impl ResolveStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Strategy names in the order they are tried.
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve an identifier through every strategy in turn.
    #[instrument(skip(self, api))]
    pub async fn resolve(
        &self,
        api: &dyn MarketDataApi,
        identifier: &str,
    ) -> Result<Market, MarketError> {
        let slug = normalize_slug(identifier);

        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), slug = %slug, "Trying resolution strategy");
            if let Some(market) = strategy.resolve(api, &slug).await? {
                info!(strategy = strategy.name(), slug = %slug, "Resolved market");
                return Ok(market);
            }
        }

        Err(MarketError::NotFound {
            identifier: identifier.to_string(),
        })
    }
}

/// Reduce a slug or a polymarket.com URL to a bare slug.
///
/// `https://polymarket.com/event/some-event?tid=1` becomes `some-event`.
pub fn normalize_slug(input: &str) -> String {
    let input = input.trim();

    if let Ok(url) = Url::parse(input) {
        if let Some(segment) = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return segment.to_string();
        }
    }

    input
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_matches('/')
        .to_string()
}
