//! Market module for Polymarket lookups.
//!
//! This module handles:
//! - Gamma and CLOB payload types
//! - API seams and their HTTP clients
//! - Slug resolution strategies
//! - Outcome price lookup
//! - Mock clients for testing

pub mod client;
pub mod clob;
pub mod gamma;
pub mod mock;
pub mod prices;
pub mod resolve;
pub mod types;

pub use client::{build_http_client, MarketDataApi, PriceDataApi};
pub use clob::ClobClient;
pub use gamma::GammaClient;
pub use mock::{MockMarketApi, MockPriceApi};
pub use prices::{prices_for, PLACEHOLDER_PRICE};
pub use resolve::{
    normalize_slug, ByMarketSlug, FirstMarketOfEvent, ResolveStrategy, Resolver,
};
pub use types::{ClobMarket, ClobMarketsPage, Event, Market, OutcomePrices, Token};
