//! Per-outcome price lookup against the CLOB market listing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, instrument, warn};

use super::client::PriceDataApi;
use super::types::OutcomePrices;
use crate::error::MarketError;

/// Price assigned to every outcome of a matched market.
///
/// The listing's token prices are not read; each outcome gets this value.
/// Whether upstream exposes a usable per-token price is unconfirmed.
pub const PLACEHOLDER_PRICE: Decimal = dec!(0.5);

/// Look up outcome prices for a condition id.
///
/// Scans the whole listing for the matching entry. Returns `Ok(None)` when
/// the condition id is not listed; that is not an error.
#[instrument(skip(api))]
pub async fn prices_for(
    api: &dyn PriceDataApi,
    condition_id: &str,
) -> Result<Option<OutcomePrices>, MarketError> {
    let page = api.list_markets().await?;
    let scanned = page.data.len();

    let Some(market) = page
        .data
        .into_iter()
        .find(|m| m.condition_id.as_deref() == Some(condition_id))
    else {
        warn!(condition_id, scanned, "Market not found in CLOB listing");
        return Ok(None);
    };

    // One entry per outcome name; a repeated name keeps its first position.
    let mut prices = OutcomePrices::new();
    for token in &market.tokens {
        let name = token.outcome_name();
        if !prices.iter().any(|(outcome, _)| outcome == name) {
            prices.push((name.to_string(), PLACEHOLDER_PRICE));
        }
    }

    debug!(condition_id, outcomes = prices.len(), "Extracted outcome prices");

    Ok(Some(prices))
}
