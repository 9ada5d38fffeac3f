//! Builds a [`PriceRow`] from market metadata and outcome prices.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use super::types::{PriceCell, PriceRow};
use crate::error::MarketError;
use crate::market::{prices_for, Market, MarketDataApi, OutcomePrices, PriceDataApi, Resolver};
use crate::metrics;

/// Title used when the market has no question.
pub const UNKNOWN_MARKET: &str = "Unknown Market";

/// Default for absent text metadata.
pub const UNKNOWN: &str = "Unknown";

/// Resolves a slug and turns the market into a row.
#[derive(Clone)]
pub struct RowBuilder {
    markets: Arc<dyn MarketDataApi>,
    prices: Arc<dyn PriceDataApi>,
    resolver: Arc<Resolver>,
}

impl std::fmt::Debug for RowBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowBuilder")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl RowBuilder {
    /// Builder with the default market-then-event resolution order.
    pub fn new(markets: Arc<dyn MarketDataApi>, prices: Arc<dyn PriceDataApi>) -> Self {
        Self::with_resolver(markets, prices, Resolver::default())
    }

    /// Builder with a custom resolution order.
    pub fn with_resolver(
        markets: Arc<dyn MarketDataApi>,
        prices: Arc<dyn PriceDataApi>,
        resolver: Resolver,
    ) -> Self {
        Self {
            markets,
            prices,
            resolver: Arc::new(resolver),
        }
    }

    /// Resolve `identifier` and build its row.
    ///
    /// Fails with `NotFound` when no strategy resolves the identifier, and
    /// with a transport-class error when the Gamma API cannot be reached.
    /// Price lookup failures never fail the row.
    #[instrument(skip(self))]
    pub async fn build_row(&self, identifier: &str) -> Result<PriceRow, MarketError> {
        let timestamp = OffsetDateTime::now_utc();

        let market = match self.resolver.resolve(self.markets.as_ref(), identifier).await {
            Ok(market) => market,
            Err(e) => {
                if e.is_not_found() {
                    metrics::inc_not_found();
                }
                error!(identifier, error = %e, "No market data available");
                return Err(e);
            }
        };

        let prices = self.lookup_prices(&market).await;
        Ok(normalize(timestamp, identifier, &market, prices))
    }

    async fn lookup_prices(&self, market: &Market) -> Option<OutcomePrices> {
        let Some(condition_id) = market.condition_id.as_deref() else {
            warn!("Market has no condition id, skipping price lookup");
            return None;
        };

        match prices_for(self.prices.as_ref(), condition_id).await {
            Ok(Some(prices)) if !prices.is_empty() => Some(prices),
            Ok(_) => None,
            Err(e) => {
                warn!(condition_id, error = %e, "Price lookup failed, writing placeholders");
                None
            }
        }
    }
}

/// Merge metadata and prices into a row.
///
/// Without prices, every outcome named by the market gets "N/A" so the
/// column set stays the same from poll to poll.
pub fn normalize(
    timestamp: OffsetDateTime,
    identifier: &str,
    market: &Market,
    prices: Option<OutcomePrices>,
) -> PriceRow {
    let text = |value: &Option<String>, default: &str| {
        value.clone().unwrap_or_else(|| default.to_string())
    };

    let prices = match prices {
        Some(prices) => prices
            .into_iter()
            .map(|(outcome, price)| (outcome, PriceCell::Price(price)))
            .collect(),
        None => market
            .outcome_names()
            .into_iter()
            .map(|outcome| (outcome, PriceCell::Unavailable))
            .collect(),
    };

    let row = PriceRow {
        timestamp,
        market_title: text(&market.question, UNKNOWN_MARKET),
        market_slug: text(&market.slug, identifier),
        condition_id: text(&market.condition_id, UNKNOWN),
        category: text(&market.category, UNKNOWN),
        end_date: market.end_date().unwrap_or(UNKNOWN).to_string(),
        active: market.active.unwrap_or(false),
        closed: market.closed.unwrap_or(false),
        prices,
    };

    info!(
        market = %row.market_slug,
        outcomes = row.prices.len(),
        "Built price row"
    );

    row
}
