//! In-memory Gamma and CLOB doubles for unit testing.
//!
//! These implement the same traits as the HTTP clients, so the resolver,
//! price lookup and row builder can be exercised without network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::client::{MarketDataApi, PriceDataApi};
use super::types::{ClobMarket, ClobMarketsPage, Event, Market};
use crate::error::MarketError;

const MOCK_GAMMA_URL: &str = "mock://gamma";
const MOCK_CLOB_URL: &str = "mock://clob";

/// Mock Gamma API.
#[derive(Debug, Clone, Default)]
pub struct MockMarketApi {
    /// Markets keyed by slug.
    markets: Arc<Mutex<HashMap<String, Vec<Market>>>>,
    /// Events keyed by slug, with their markets in order.
    events: Arc<Mutex<HashMap<String, (Event, Vec<Market>)>>>,
    /// Fail every `/markets?slug=` lookup.
    fail_markets: Arc<Mutex<bool>>,
    /// Fail every event lookup.
    fail_events: Arc<Mutex<bool>>,
    /// Number of `/markets?slug=` calls.
    market_calls: Arc<AtomicUsize>,
    /// Number of `/events?slug=` calls.
    event_calls: Arc<AtomicUsize>,
}

impl MockMarketApi {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a market under its own slug.
    pub fn add_market(&self, market: Market) {
        let slug = market.slug.clone().unwrap_or_default();
        self.add_market_as(&slug, market);
    }

    /// Register a market under an explicit slug query.
    pub fn add_market_as(&self, slug: &str, market: Market) {
        self.markets
            .lock()
            .unwrap()
            .entry(slug.to_string())
            .or_default()
            .push(market);
    }

    /// Register an event and the markets it owns.
    pub fn add_event(&self, event: Event, markets: Vec<Market>) {
        let slug = event.slug.clone().unwrap_or_default();
        self.events.lock().unwrap().insert(slug, (event, markets));
    }

    /// Make market-slug lookups fail with an HTTP 503.
    pub fn fail_market_lookups(&self, fail: bool) {
        *self.fail_markets.lock().unwrap() = fail;
    }

    /// Make event lookups fail with an HTTP 503.
    pub fn fail_event_lookups(&self, fail: bool) {
        *self.fail_events.lock().unwrap() = fail;
    }

    /// Number of market-slug lookups served.
    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }

    /// Number of event lookups served.
    pub fn event_calls(&self) -> usize {
        self.event_calls.load(Ordering::SeqCst)
    }

    fn unavailable(path: &str) -> MarketError {
        MarketError::HttpStatus {
            endpoint: format!("{MOCK_GAMMA_URL}/{path}"),
            status: 503,
        }
    }
}

#[async_trait]
impl MarketDataApi for MockMarketApi {
    async fn markets_by_slug(&self, slug: &str) -> Result<Vec<Market>, MarketError> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_markets.lock().unwrap() {
            return Err(Self::unavailable("markets"));
        }
        Ok(self
            .markets
            .lock()
            .unwrap()
            .get(slug)
            .cloned()
            .unwrap_or_default())
    }

    async fn events_by_slug(&self, slug: &str) -> Result<Vec<Event>, MarketError> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_events.lock().unwrap() {
            return Err(Self::unavailable("events"));
        }
        Ok(self
            .events
            .lock()
            .unwrap()
            .get(slug)
            .map(|(event, _)| vec![event.clone()])
            .unwrap_or_default())
    }

    async fn markets_for_event(&self, event_slug: &str) -> Result<Vec<Market>, MarketError> {
        if *self.fail_events.lock().unwrap() {
            return Err(Self::unavailable("markets"));
        }
        Ok(self
            .events
            .lock()
            .unwrap()
            .get(event_slug)
            .map(|(_, markets)| markets.clone())
            .unwrap_or_default())
    }
}

/// Mock CLOB API.
#[derive(Debug, Clone, Default)]
pub struct MockPriceApi {
    /// Listing returned by `/markets`, in order.
    markets: Arc<Mutex<Vec<ClobMarket>>>,
    /// Fail every listing call.
    fail: Arc<Mutex<bool>>,
    /// Number of listing calls.
    calls: Arc<AtomicUsize>,
}

impl MockPriceApi {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a market to the listing.
    pub fn add_market(&self, market: ClobMarket) {
        self.markets.lock().unwrap().push(market);
    }

    /// Make the listing fail with an HTTP 503.
    pub fn fail_listing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Number of listing calls served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceDataApi for MockPriceApi {
    async fn list_markets(&self) -> Result<ClobMarketsPage, MarketError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock().unwrap() {
            return Err(MarketError::HttpStatus {
                endpoint: format!("{MOCK_CLOB_URL}/markets"),
                status: 503,
            });
        }
        Ok(ClobMarketsPage {
            data: self.markets.lock().unwrap().clone(),
            next_cursor: None,
        })
    }
}
