//! Polymarket-to-Google-Sheets price poller entry point.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use polymarket_sheets::api::{create_router, AppState};
use polymarket_sheets::config::{Config, SinkKind};
use polymarket_sheets::market::{build_http_client, ClobClient, GammaClient};
use polymarket_sheets::metrics;
use polymarket_sheets::row::RowBuilder;
use polymarket_sheets::sheets::{GoogleSheetsClient, RowSink, StdoutSink};
use polymarket_sheets::utils::Shutdown;
use polymarket_sheets::PriceAgent;

/// Polls a Polymarket market and appends its prices to a Google Sheet.
#[derive(Parser, Debug)]
#[command(name = "polymarket-sheets")]
#[command(about = "Poll Polymarket prices and append them to a Google Sheet")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduler and the health server (default).
    Run {
        /// HTTP server port for health/metrics.
        #[arg(short, long)]
        port: Option<u16>,

        /// Minutes between updates.
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run a single update and exit.
    Once,

    /// Print the agent status.
    Status,

    /// Check configuration validity.
    CheckConfig,

    /// Resolve a slug or market URL and print its row without writing it.
    Resolve {
        /// Market slug, event slug, or polymarket.com URL.
        slug: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging; falls back to defaults if configuration fails to load
    let loaded = Config::load();
    let defaults = Config::default();
    init_logging(args.verbose, loaded.as_ref().unwrap_or(&defaults))?;

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(loaded),
        Some(Command::Run { port, interval }) => cmd_run(loaded?, port, interval).await,
        Some(Command::Once) => cmd_once(loaded?).await,
        Some(Command::Status) => cmd_status(loaded?).await,
        Some(Command::Resolve { slug }) => cmd_resolve(loaded?, &slug).await,
        None => cmd_run(loaded?, None, None).await,
    }
}

/// Install the tracing subscriber: console output plus an optional log file.
fn init_logging(verbose: bool, config: &Config) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("polymarket_sheets=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    let console = if config.log_json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let file = match config.log_file.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    Ok(())
}

/// Validate configuration, logging the problem before failing.
fn validated(config: Config) -> anyhow::Result<Config> {
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }
    Ok(config)
}

/// Build the agent and its clients over one shared HTTP session.
fn build_agent(config: &Config) -> anyhow::Result<PriceAgent> {
    let http = build_http_client(config).context("failed to build HTTP client")?;

    let markets = Arc::new(GammaClient::new(
        http.clone(),
        &config.polymarket_gamma_api_base,
    ));
    let prices = Arc::new(ClobClient::new(
        http.clone(),
        &config.polymarket_clob_api_base,
    ));

    let sink: Arc<dyn RowSink> = match config.row_sink {
        SinkKind::Sheets => Arc::new(GoogleSheetsClient::new(
            http,
            &config.google_sheets_api_base,
            config.sheet_id().unwrap_or_default(),
            &config.google_sheet_name,
            config.access_token().unwrap_or_default(),
        )),
        SinkKind::Stdout => Arc::new(StdoutSink),
    };

    Ok(PriceAgent::from_config(config, markets, prices, sink))
}

/// Check configuration validity.
fn cmd_check_config(loaded: Result<Config, envy::Error>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("POLYMARKET SHEETS - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match loaded {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    match (config.market_slug(), config.event_slug()) {
        (Some(market), _) => println!("  Market Slug: {}", market),
        (None, Some(event)) => println!("  Event Slug: {}", event),
        (None, None) => println!("  Slug: (none)"),
    }
    println!("  Gamma API: {}", config.polymarket_gamma_api_base);
    println!("  CLOB API: {}", config.polymarket_clob_api_base);
    println!("  Row Sink: {}", config.row_sink);
    if config.row_sink == SinkKind::Sheets {
        println!("  Sheet ID: {}", config.sheet_id().unwrap_or_default());
        println!("  Sheet Name: {}", config.google_sheet_name);
        println!("  Access Token: present");
    }
    println!("  Update Interval: {} minutes", config.update_interval_minutes);
    println!("  HTTP Timeout: {} ms", config.http_timeout_ms);
    println!("  Health Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run a single update.
async fn cmd_once(config: Config) -> anyhow::Result<()> {
    let config = validated(config)?;
    let agent = build_agent(&config)?;

    let start = Instant::now();
    let row = agent.update_once().await?;
    info!(
        market = %row.market_slug,
        duration_ms = start.elapsed().as_millis() as u64,
        "Single update completed"
    );

    Ok(())
}

/// Print the status snapshot.
async fn cmd_status(config: Config) -> anyhow::Result<()> {
    let config = validated(config)?;
    let agent = build_agent(&config)?;

    let status = agent.status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);

    Ok(())
}

/// Resolve a slug and print its row.
async fn cmd_resolve(config: Config, slug: &str) -> anyhow::Result<()> {
    let http = build_http_client(&config).context("failed to build HTTP client")?;
    let builder = RowBuilder::new(
        Arc::new(GammaClient::new(
            http.clone(),
            &config.polymarket_gamma_api_base,
        )),
        Arc::new(ClobClient::new(http, &config.polymarket_clob_api_base)),
    );

    println!("======================================================================");
    println!("RESOLVE: {}", slug);
    println!("======================================================================");

    let row = builder.build_row(slug).await?;
    for (column, value) in row.columns() {
        println!("  {:<16} {}", column, value);
    }
    println!("======================================================================");

    Ok(())
}

/// Run the scheduler and the health server until shutdown.
async fn cmd_run(
    mut config: Config,
    port_override: Option<u16>,
    interval_override: Option<u64>,
) -> anyhow::Result<()> {
    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }
    if let Some(interval) = interval_override {
        config.update_interval_minutes = interval;
    }

    let config = validated(config)?;
    info!("Configuration loaded successfully");

    let agent = Arc::new(build_agent(&config)?);

    // Initialize metrics
    let mut app_state = AppState::new(agent.clone());
    match metrics::install_prometheus() {
        Ok(handle) => app_state = app_state.with_metrics(handle),
        Err(e) => warn!("Prometheus recorder not installed: {}", e),
    }

    let shutdown = Shutdown::from_signals();

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state);

    // Spawn HTTP server
    let server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.wait())
                .await
        }
    });

    info!("========================================");
    info!("POLYMARKET SHEETS AGENT STARTED");
    info!("========================================");
    info!("Tracking: {}", agent.identifier());
    info!("Sink: {}", config.row_sink);
    info!("Interval: {} minutes", config.update_interval_minutes);
    info!("========================================");

    agent.run(shutdown.wait()).await;

    server.await??;
    info!("Shutdown complete");

    Ok(())
}
