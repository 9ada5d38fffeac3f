//! Poll scheduler: builds a row for the tracked slug and forwards it to the sink.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AgentError;
use crate::market::{MarketDataApi, PriceDataApi};
use crate::metrics;
use crate::row::{PriceRow, RowBuilder};
use crate::sheets::RowSink;

/// Result of the most recent poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollOutcome {
    /// When the cycle finished (RFC 3339, UTC).
    pub finished_at: String,
    /// Whether a row reached the sink.
    pub success: bool,
    /// Cycle duration in milliseconds.
    pub duration_ms: u64,
    /// Slug of the market written, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_slug: Option<String>,
    /// Failure message, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot returned by [`PriceAgent::status`].
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    /// Whether the scheduler loop is running.
    pub running: bool,
    /// Whether the last poll succeeded.
    pub ready: bool,
    /// Row sink in use.
    pub sink: &'static str,
    /// Configured market slug.
    pub market_slug: Option<String>,
    /// Configured event slug.
    pub event_slug: Option<String>,
    /// Poll interval in minutes.
    pub update_interval_minutes: u64,
    /// Timestamp of the last row the sink holds.
    pub last_update: Option<String>,
    /// Outcome of the last poll in this process.
    pub last_poll: Option<PollOutcome>,
}

/// Shared, cloneable view of the scheduler's progress.
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    running: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
    last_poll: Arc<RwLock<Option<PollOutcome>>>,
}

impl AgentState {
    /// Whether the scheduler loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether the last poll wrote a row.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Outcome of the last poll.
    pub async fn last_poll(&self) -> Option<PollOutcome> {
        self.last_poll.read().await.clone()
    }

    async fn record(&self, outcome: PollOutcome) {
        self.ready.store(outcome.success, Ordering::SeqCst);
        *self.last_poll.write().await = Some(outcome);
    }
}

/// Polls one market on a fixed interval.
pub struct PriceAgent {
    builder: RowBuilder,
    sink: Arc<dyn RowSink>,
    market_slug: Option<String>,
    event_slug: Option<String>,
    interval: Duration,
    state: AgentState,
}

impl std::fmt::Debug for PriceAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceAgent")
            .field("sink", &self.sink.name())
            .field("market_slug", &self.market_slug)
            .field("event_slug", &self.event_slug)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl PriceAgent {
    /// Create an agent for an explicit slug pair.
    ///
    /// The market slug is polled when both are set. Either slug goes through
    /// the full market-then-event resolution chain. `interval` must be
    /// non-zero; [`Config::validate`] rejects a zero interval.
    pub fn new(
        markets: Arc<dyn MarketDataApi>,
        prices: Arc<dyn PriceDataApi>,
        sink: Arc<dyn RowSink>,
        market_slug: Option<String>,
        event_slug: Option<String>,
        interval: Duration,
    ) -> Self {
        Self {
            builder: RowBuilder::new(markets, prices),
            sink,
            market_slug,
            event_slug,
            interval,
            state: AgentState::default(),
        }
    }

    /// Create an agent from loaded configuration.
    pub fn from_config(
        config: &Config,
        markets: Arc<dyn MarketDataApi>,
        prices: Arc<dyn PriceDataApi>,
        sink: Arc<dyn RowSink>,
    ) -> Self {
        Self::new(
            markets,
            prices,
            sink,
            config.market_slug().map(str::to_string),
            config.event_slug().map(str::to_string),
            config.update_interval(),
        )
    }

    /// Identifier polled each cycle.
    pub fn identifier(&self) -> &str {
        self.market_slug
            .as_deref()
            .or(self.event_slug.as_deref())
            .unwrap_or_default()
    }

    /// Handle to the scheduler's progress.
    pub fn state(&self) -> AgentState {
        self.state.clone()
    }

    /// Build one row and write it to the sink.
    pub async fn update_once(&self) -> Result<PriceRow, AgentError> {
        metrics::inc_polls();

        let row = self.builder.build_row(self.identifier()).await?;
        self.sink.write_row(&row).await?;
        metrics::inc_rows_written();

        info!(
            market = %row.market_slug,
            sink = self.sink.name(),
            "Wrote price row"
        );
        Ok(row)
    }

    /// Run one update, logging and recording the outcome. Returns whether a
    /// row was written.
    pub async fn run_scheduled_update(&self) -> bool {
        let start = Instant::now();
        info!(identifier = self.identifier(), "Starting scheduled update");

        let result = self.update_once().await;
        metrics::record_poll_duration(start);
        let duration_ms = start.elapsed().as_millis() as u64;

        let outcome = match &result {
            Ok(row) => {
                info!(duration_ms, "Scheduled update completed");
                PollOutcome {
                    finished_at: now_rfc3339(),
                    success: true,
                    duration_ms,
                    market_slug: Some(row.market_slug.clone()),
                    error: None,
                }
            }
            Err(e) => {
                metrics::inc_poll_failures();
                error!(identifier = self.identifier(), duration_ms, error = %e, "Scheduled update failed");
                PollOutcome {
                    finished_at: now_rfc3339(),
                    success: false,
                    duration_ms,
                    market_slug: None,
                    error: Some(e.to_string()),
                }
            }
        };

        let success = outcome.success;
        self.state.record(outcome).await;
        success
    }

    /// Poll immediately, then once per interval, until `shutdown` resolves.
    ///
    /// Cycles never overlap; a tick missed while a cycle runs is delayed.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.state.running.store(true, Ordering::SeqCst);
        info!(
            identifier = self.identifier(),
            interval_secs = self.interval.as_secs(),
            sink = self.sink.name(),
            "Price agent started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_scheduled_update().await;
                }
            }
        }

        self.state.running.store(false, Ordering::SeqCst);
        info!("Price agent stopped");
    }

    /// Current status, including the last update time the sink reports.
    pub async fn status(&self) -> AgentStatus {
        let last_update = match self.sink.last_update_time().await {
            Ok(ts) => ts.and_then(|ts| ts.format(&Rfc3339).ok()),
            Err(e) => {
                warn!(sink = self.sink.name(), error = %e, "Could not read last update time");
                None
            }
        };

        AgentStatus {
            running: self.state.is_running(),
            ready: self.state.is_ready(),
            sink: self.sink.name(),
            market_slug: self.market_slug.clone(),
            event_slug: self.event_slug.clone(),
            update_interval_minutes: self.interval.as_secs() / 60,
            last_update,
            last_poll: self.state.last_poll().await,
        }
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{ClobMarket, Event, Market, MockMarketApi, MockPriceApi, Token};
    use crate::row::PriceCell;
    use crate::sheets::MemorySink;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn market(slug: &str) -> Market {
        Market {
            slug: Some(slug.to_string()),
            condition_id: Some(format!("0x{slug}")),
            question: Some(format!("Question for {slug}?")),
            tokens: Some(vec![
                Token {
                    outcome: Some("Yes".to_string()),
                    ..Token::default()
                },
                Token {
                    outcome: Some("No".to_string()),
                    ..Token::default()
                },
            ]),
            ..Market::default()
        }
    }

    struct Fixture {
        markets: MockMarketApi,
        prices: MockPriceApi,
        sink: MemorySink,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                markets: MockMarketApi::new(),
                prices: MockPriceApi::new(),
                sink: MemorySink::new(),
            }
        }

        fn agent(&self, market_slug: Option<&str>, event_slug: Option<&str>) -> PriceAgent {
            self.agent_every(market_slug, event_slug, Duration::from_secs(600))
        }

        fn agent_every(
            &self,
            market_slug: Option<&str>,
            event_slug: Option<&str>,
            interval: Duration,
        ) -> PriceAgent {
            PriceAgent::new(
                Arc::new(self.markets.clone()),
                Arc::new(self.prices.clone()),
                Arc::new(self.sink.clone()),
                market_slug.map(str::to_string),
                event_slug.map(str::to_string),
                interval,
            )
        }
    }

    #[tokio::test]
    async fn update_once_writes_row_to_sink() {
        let fx = Fixture::new();
        fx.markets.add_market(market("rain"));
        fx.prices.add_market(ClobMarket {
            condition_id: Some("0xrain".to_string()),
            market_slug: None,
            tokens: market("rain").tokens.unwrap_or_default(),
        });

        let row = fx.agent(Some("rain"), None).update_once().await.unwrap();

        assert_eq!(fx.sink.rows(), vec![row.clone()]);
        assert_eq!(
            row.prices,
            vec![
                ("Yes".to_string(), PriceCell::Price(dec!(0.5))),
                ("No".to_string(), PriceCell::Price(dec!(0.5))),
            ]
        );
    }

    #[tokio::test]
    async fn event_slug_is_used_without_market_slug() {
        let fx = Fixture::new();
        fx.markets.add_event(
            Event {
                slug: Some("election".to_string()),
                ..Event::default()
            },
            vec![market("first"), market("second")],
        );

        let agent = fx.agent(None, Some("election"));
        assert_eq!(agent.identifier(), "election");

        let row = agent.update_once().await.unwrap();
        assert_eq!(row.market_slug, "first");
        assert_eq!(fx.markets.market_calls(), 1);
    }

    #[tokio::test]
    async fn market_slug_setting_falls_back_to_event_lookup() {
        let fx = Fixture::new();
        fx.markets.add_event(
            Event {
                slug: Some("election".to_string()),
                ..Event::default()
            },
            vec![market("first")],
        );

        let row = fx.agent(Some("election"), None).update_once().await.unwrap();
        assert_eq!(row.market_slug, "first");
        assert_eq!(fx.sink.rows().len(), 1);
    }

    #[tokio::test]
    async fn event_slug_setting_resolves_a_market_slug() {
        let fx = Fixture::new();
        fx.markets.add_market(market("rain"));

        let row = fx.agent(None, Some("rain")).update_once().await.unwrap();
        assert_eq!(row.market_slug, "rain");
        assert_eq!(fx.markets.event_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_slug_leaves_sink_untouched() {
        let fx = Fixture::new();
        let agent = fx.agent(Some("nope"), None);

        let err = agent.update_once().await.unwrap_err();
        assert!(matches!(err, AgentError::Market(ref e) if e.is_not_found()));
        assert!(fx.sink.rows().is_empty());
    }

    #[tokio::test]
    async fn scheduled_update_records_outcomes() {
        let fx = Fixture::new();
        fx.markets.add_market(market("rain"));
        let agent = fx.agent(Some("rain"), None);
        let state = agent.state();

        assert!(agent.run_scheduled_update().await);
        assert!(state.is_ready());
        let last = state.last_poll().await.unwrap();
        assert!(last.success);
        assert_eq!(last.market_slug.as_deref(), Some("rain"));

        fx.sink.fail_writes(true);
        assert!(!agent.run_scheduled_update().await);
        assert!(!state.is_ready());
        let last = state.last_poll().await.unwrap();
        assert!(!last.success);
        assert!(last.error.is_some());
        assert_eq!(fx.sink.rows().len(), 1);
    }

    #[tokio::test]
    async fn run_polls_immediately_and_stops_on_shutdown() {
        let fx = Fixture::new();
        fx.markets.add_market(market("rain"));
        let agent = fx.agent(Some("rain"), None);

        agent
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await;

        assert_eq!(fx.sink.rows().len(), 1);
        assert!(!agent.state().is_running());
    }

    #[tokio::test]
    async fn run_keeps_polling_after_failures() {
        let fx = Fixture::new();
        fx.markets.add_market(market("rain"));
        fx.markets.fail_market_lookups(true);
        let agent = fx.agent_every(Some("rain"), None, Duration::from_millis(20));

        agent
            .run(tokio::time::sleep(Duration::from_millis(150)))
            .await;

        assert!(fx.markets.market_calls() >= 2);
        assert!(fx.sink.rows().is_empty());
    }

    #[tokio::test]
    async fn status_reports_configuration_and_last_update() {
        let fx = Fixture::new();
        fx.markets.add_market(market("rain"));
        let agent = fx.agent(Some("rain"), Some("election"));

        let status = agent.status().await;
        assert!(!status.running);
        assert_eq!(status.sink, "memory");
        assert_eq!(status.update_interval_minutes, 10);
        assert_eq!(status.last_update, None);
        assert_eq!(status.last_poll, None);

        agent.run_scheduled_update().await;
        let status = agent.status().await;
        assert!(status.ready);
        assert_eq!(status.market_slug.as_deref(), Some("rain"));
        assert_eq!(status.event_slug.as_deref(), Some("election"));
        assert!(status.last_update.is_some());
    }
}
