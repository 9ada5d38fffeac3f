//! Integration tests for the Polymarket price poller.
//!
//! The pipeline tests run against in-memory doubles. Tests marked `#[ignore]`
//! call the real Gamma and CLOB APIs.
//! Run with: cargo test --test integration -- --ignored

use std::sync::Arc;
use std::time::Duration;

use polymarket_sheets::config::Config;
use polymarket_sheets::market::{
    build_http_client, ClobClient, ClobMarket, Event, GammaClient, Market, MarketDataApi,
    MockMarketApi, MockPriceApi, PriceDataApi, Token,
};
use polymarket_sheets::row::{CellValue, PriceCell, RowBuilder, NOT_AVAILABLE};
use polymarket_sheets::sheets::{MemorySink, RowSink};
use polymarket_sheets::PriceAgent;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn tokens(outcomes: &[&str]) -> Vec<Token> {
    outcomes
        .iter()
        .map(|o| Token {
            token_id: Some(format!("token-{o}")),
            outcome: Some(o.to_string()),
            price: Some(dec!(0.37)),
        })
        .collect()
}

fn market(slug: &str, condition_id: &str, outcomes: &[&str]) -> Market {
    Market {
        slug: Some(slug.to_string()),
        condition_id: Some(condition_id.to_string()),
        question: Some(format!("{slug}?")),
        category: Some("Politics".to_string()),
        end_date: Some("2026-11-03".to_string()),
        end_date_time: None,
        active: Some(true),
        closed: Some(false),
        tokens: Some(tokens(outcomes)),
        outcomes: None,
    }
}

#[tokio::test]
async fn event_pipeline_writes_first_market_row() {
    let markets = MockMarketApi::new();
    let prices = MockPriceApi::new();
    let sink = MemorySink::new();

    markets.add_event(
        Event {
            id: Some("1".to_string()),
            slug: Some("us-election".to_string()),
            title: Some("US Election".to_string()),
        },
        vec![
            market("winner", "0xwin", &["Dem", "Rep", "Other"]),
            market("turnout", "0xturn", &["Yes", "No"]),
        ],
    );
    prices.add_market(ClobMarket {
        condition_id: Some("0xturn".to_string()),
        market_slug: Some("turnout".to_string()),
        tokens: tokens(&["Yes", "No"]),
    });
    prices.add_market(ClobMarket {
        condition_id: Some("0xwin".to_string()),
        market_slug: Some("winner".to_string()),
        tokens: tokens(&["Dem", "Rep", "Other"]),
    });

    let agent = PriceAgent::new(
        Arc::new(markets),
        Arc::new(prices),
        Arc::new(sink.clone()),
        None,
        Some("us-election".to_string()),
        Duration::from_secs(600),
    );

    assert!(agent.run_scheduled_update().await);

    let rows = sink.rows();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(
        row.headers(),
        vec![
            "timestamp",
            "market_title",
            "market_slug",
            "condition_id",
            "category",
            "end_date",
            "active",
            "closed",
            "Dem_price",
            "Rep_price",
            "Other_price",
        ]
    );
    assert_eq!(row.get("market_slug"), Some(CellValue::Text("winner".to_string())));
    assert_eq!(row.get("Rep_price"), Some(CellValue::Number(dec!(0.5))));
    assert_eq!(row.get("active"), Some(CellValue::Flag(true)));
}

#[tokio::test]
async fn unlisted_market_writes_placeholders_with_stable_columns() {
    let markets = MockMarketApi::new();
    markets.add_market(market("rain", "0xrain", &["Yes", "No"]));
    let builder = RowBuilder::new(Arc::new(markets), Arc::new(MockPriceApi::new()));

    let row = builder.build_row("rain").await.unwrap();

    assert_eq!(
        row.prices,
        vec![
            ("Yes".to_string(), PriceCell::Unavailable),
            ("No".to_string(), PriceCell::Unavailable),
        ]
    );
    assert_eq!(
        row.get("Yes_price"),
        Some(CellValue::Text(NOT_AVAILABLE.to_string()))
    );
}

#[tokio::test]
async fn market_url_resolves_like_its_slug() {
    let markets = MockMarketApi::new();
    markets.add_market(market("rain", "0xrain", &["Yes", "No"]));
    let builder = RowBuilder::new(Arc::new(markets), Arc::new(MockPriceApi::new()));

    let row = builder
        .build_row("https://polymarket.com/event/rain?tid=42")
        .await
        .unwrap();

    assert_eq!(row.market_slug, "rain");
}

#[tokio::test]
async fn failed_cycle_does_not_stop_later_cycles() {
    let markets = MockMarketApi::new();
    markets.add_market(market("rain", "0xrain", &["Yes", "No"]));
    let sink = MemorySink::new();
    let agent = PriceAgent::new(
        Arc::new(markets.clone()),
        Arc::new(MockPriceApi::new()),
        Arc::new(sink.clone()),
        Some("rain".to_string()),
        None,
        Duration::from_secs(600),
    );

    markets.fail_market_lookups(true);
    assert!(!agent.run_scheduled_update().await);
    assert!(sink.rows().is_empty());

    markets.fail_market_lookups(false);
    assert!(agent.run_scheduled_update().await);
    assert_eq!(sink.rows().len(), 1);
    assert!(sink.last_update_time().await.unwrap().is_some());
}

/// Test that a live market slug resolves against the Gamma API.
#[tokio::test]
#[ignore = "requires network access"]
async fn test_live_gamma_lookup() {
    let config = Config::default();
    let http = build_http_client(&config).unwrap();
    let gamma = GammaClient::new(http, &config.polymarket_gamma_api_base);

    let markets = gamma.markets_by_slug("this-slug-should-not-exist-42").await;
    assert!(markets.is_ok(), "Gamma lookup failed: {:?}", markets.err());
    assert!(markets.unwrap().is_empty());
}

/// Test that the CLOB listing is reachable and decodes.
#[tokio::test]
#[ignore = "requires network access"]
async fn test_live_clob_listing() {
    let config = Config::default();
    let http = build_http_client(&config).unwrap();
    let clob = ClobClient::new(http, &config.polymarket_clob_api_base);

    match clob.list_markets().await {
        Ok(page) => println!("CLOB listing returned {} markets", page.data.len()),
        Err(e) => panic!("CLOB listing failed: {}", e),
    }
}
