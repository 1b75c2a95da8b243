use anyhow::Context;
use api_client::{PublicFeedClient, TaSummaryClient};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use configuration::{load_config, AltseasonParams, Config, ConfigArgs};
use core_types::{DominanceSnapshot, MarketSnapshot, WhaleAlert, WhaleSide};
use dashboard::{Dashboard, DashboardSnapshot};
use rust_decimal::Decimal;
use scoring::format::{format_change, format_market_cap, format_price, format_time_ago, format_volume};
use scoring::{
    battle_contributions, compute_battle, AltseasonCalculator, BattleVerdict, Side,
};
use simulator::RandomWhaleSource;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use web_server::AppState;

/// The main entry point for the BTC battle dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets such as the language model key may live in a .env file.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Battle(args) => {
            init_console_tracing();
            handle_battle(args)
        }
        Commands::Altseason(args) => {
            init_console_tracing();
            handle_altseason(args, &cli.config)
        }
        Commands::Watch(args) => {
            let config = load_config(&cli.config.config)?;
            let _guard = configuration::init_tracing(&config.logging)?;
            handle_watch(args, config).await
        }
        Commands::Serve => {
            let config = load_config(&cli.config.config)?;
            let _guard = configuration::init_tracing(&config.logging)?;
            handle_serve(config).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Bull vs bear battle and altseason scores for BTC.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a bull vs bear battle from readings given on the command line.
    Battle(BattleArgs),
    /// Score the altseason from dominance and price given on the command line.
    Altseason(AltseasonArgs),
    /// Run the live dashboard and print a summary table periodically.
    Watch(WatchArgs),
    /// Run the live dashboard behind the HTTP and WebSocket API.
    Serve,
}

#[derive(Parser)]
struct BattleArgs {
    /// Signed 24h price change in percent (e.g. "-3.5").
    #[arg(long, allow_hyphen_values = true)]
    change: f64,

    /// Fear & greed index, 0-100.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    fear_greed: u8,

    #[arg(long)]
    rsi: f64,

    #[arg(long)]
    long_short: f64,

    /// A whale alert as `side:amount`, oldest first (e.g. "buy:1500"). Repeatable.
    #[arg(long = "whale", value_parser = parse_whale)]
    whales: Vec<WhaleAlert>,

    /// Tug position kept when both powers are zero.
    #[arg(long, default_value_t = 50.0)]
    previous_tug: f64,
}

/// The three dominance flags go together; without them the score is neutral.
#[derive(Parser)]
struct AltseasonArgs {
    /// BTC market cap share in percent.
    #[arg(long, requires_all = ["others", "stablecoin"])]
    btc_dominance: Option<f64>,

    /// Market cap share of everything but BTC and ETH, in percent.
    #[arg(long, requires_all = ["btc_dominance", "stablecoin"])]
    others: Option<f64>,

    /// Combined stablecoin market cap share, in percent.
    #[arg(long, requires_all = ["btc_dominance", "others"])]
    stablecoin: Option<f64>,

    /// BTC price in USD.
    #[arg(long)]
    price: Option<Decimal>,

    /// Score as of this date instead of now (YYYY-MM-DD, 00:00 UTC).
    #[arg(long)]
    at: Option<NaiveDate>,
}

#[derive(Parser)]
struct WatchArgs {
    /// How often the summary table is printed.
    #[arg(long, default_value_t = 10)]
    every_secs: u64,
}

fn parse_whale(raw: &str) -> Result<WhaleAlert, String> {
    let (side, amount) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected side:amount, got '{}'", raw))?;
    let side: WhaleSide = side.parse().map_err(|e| format!("{}", e))?;
    let amount: f64 = amount
        .parse()
        .map_err(|_| format!("invalid BTC amount '{}'", amount))?;
    if amount < 0.0 {
        return Err(format!("BTC amount must not be negative, got {}", amount));
    }
    Ok(WhaleAlert::new(side, amount))
}

fn init_console_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Ignore the error if a subscriber is already set.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).compact().try_init();
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

// ==============================================================================
// One-shot Scoring Commands
// ==============================================================================

fn handle_battle(args: BattleArgs) -> anyhow::Result<()> {
    // The tape is most-recent-first, the command line is oldest first.
    let mut whales = args.whales;
    whales.reverse();

    let snapshot = MarketSnapshot {
        price_change_pct_24h: args.change,
        fear_greed: args.fear_greed,
        rsi: args.rsi,
        long_short_ratio: args.long_short,
        recent_whale_alerts: whales,
    };

    let result = compute_battle(&snapshot, args.previous_tug);
    let mut table = new_table(vec!["Factor", "Side", "Power"]);
    for term in battle_contributions(&snapshot) {
        let side = match term.side {
            Side::Bull => "Bull",
            Side::Bear => "Bear",
        };
        table.add_row(vec![
            Cell::new(format!("{:?}", term.factor)),
            Cell::new(side),
            Cell::new(format!("{:.2}", term.amount)),
        ]);
    }
    println!("{table}");

    let verdict = BattleVerdict::from_tug(result.tug_position);
    println!(
        "Bulls {:.2} vs Bears {:.2} | tug {:.1} | {}",
        result.bull_power,
        result.bear_power,
        result.tug_position,
        verdict.label()
    );
    Ok(())
}

fn handle_altseason(args: AltseasonArgs, config_args: &ConfigArgs) -> anyhow::Result<()> {
    let params = if config_args.config.exists() {
        load_config(&config_args.config)?.altseason
    } else {
        tracing::warn!(path = %config_args.config.display(), "No config file; using default altseason levels.");
        AltseasonParams::default()
    };
    let calculator = AltseasonCalculator::new(params)?;

    let dominance = match (args.btc_dominance, args.others, args.stablecoin) {
        (Some(btc), Some(others), Some(stable)) => Some(DominanceSnapshot {
            btc_dominance_pct: btc,
            others_dominance_pct: others,
            stablecoin_dominance_pct: stable,
        }),
        _ => None,
    };
    let now = match args.at {
        Some(date) => date.and_hms_opt(0, 0, 0).context("invalid date")?.and_utc(),
        None => Utc::now(),
    };

    let result = calculator.calculate(dominance.as_ref(), args.price, now);
    let mut table = new_table(vec!["#", "Signal"]);
    for (i, signal) in result.signals.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(signal)]);
    }
    println!("{table}");
    println!(
        "Altseason score: {}/100 ({} days remaining)",
        result.score,
        calculator.days_remaining(now)
    );
    Ok(())
}

// ==============================================================================
// Live Dashboard Commands
// ==============================================================================

fn build_dashboard(config: &Config) -> anyhow::Result<Dashboard> {
    let feeds = PublicFeedClient::new(config.feeds.clone())?;
    let whales = RandomWhaleSource::new(config.simulator.clone())?;
    Ok(Dashboard::new(config, Arc::new(feeds), Box::new(whales))?)
}

async fn handle_watch(args: WatchArgs, config: Config) -> anyhow::Result<()> {
    let dashboard = build_dashboard(&config)?;
    let handle = dashboard.handle();

    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let poller = tokio::spawn(dashboard.run(wait_for_stop(stop_rx)));

    let mut ticker = tokio::time::interval(Duration::from_secs(args.every_secs.max(1)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => println!("{}", snapshot_table(&handle.snapshot().await)),
        }
    }

    let _ = stop_tx.send(true);
    poller.await??;
    Ok(())
}

async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server.host / server.port")?;

    let ta_summary = match TaSummaryClient::new(config.llm.clone(), config.feeds.request_timeout) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "TA summaries disabled.");
            None
        }
    };

    let dashboard = build_dashboard(&config)?;
    let state = AppState {
        dashboard: dashboard.handle(),
        ta_summary,
    };

    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let poller = tokio::spawn(dashboard.run(wait_for_stop(stop_rx.clone())));

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown requested.");
        let _ = stop_tx.send(true);
    });

    web_server::run_server(addr, state, wait_for_stop(stop_rx)).await?;
    poller.await??;
    Ok(())
}

async fn wait_for_stop(mut stop: tokio::sync::watch::Receiver<bool>) {
    while !*stop.borrow() {
        if stop.changed().await.is_err() {
            break;
        }
    }
}

fn snapshot_table(snapshot: &DashboardSnapshot) -> Table {
    let mut table = new_table(vec!["Metric", "Value"]);
    let whale = snapshot
        .whales
        .first()
        .map(|w| {
            format!(
                "{} {:.0} BTC (${}M) on {}, {}",
                w.side,
                w.amount_btc,
                w.usd_value_millions,
                w.exchange,
                format_time_ago(w.timestamp, Utc::now())
            )
        })
        .unwrap_or_else(|| "-".to_string());

    let rows = vec![
        ("BTC price", format_price(snapshot.price)),
        ("24h change", format_change(snapshot.change_24h_pct)),
        (
            "24h volume",
            snapshot.volume_24h.map(format_volume).unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Market cap",
            snapshot.market_cap.map(format_market_cap).unwrap_or_else(|| "-".to_string()),
        ),
        ("BTC dominance", format!("{:.1}%", snapshot.btc_dominance_pct)),
        ("Stablecoin dominance", format!("{:.1}%", snapshot.stablecoin_dominance_pct)),
        (
            "Fear & greed",
            format!(
                "{} {} ({})",
                snapshot.weather.icon(),
                snapshot.fear_greed.value,
                snapshot.fear_greed.classification
            ),
        ),
        ("RSI", format!("{:.1} ({:?})", snapshot.rsi, snapshot.rsi_zone)),
        (
            "Long/short",
            format!("{:.2} ({:?})", snapshot.long_short_ratio, snapshot.positioning),
        ),
        (
            "Battle",
            format!(
                "{:.2} vs {:.2}, tug {:.1}: {}",
                snapshot.battle.bull_power,
                snapshot.battle.bear_power,
                snapshot.battle.tug_position,
                snapshot.verdict_label
            ),
        ),
        (
            "Altseason",
            format!("{}/100, {} days left", snapshot.altseason.score, snapshot.days_remaining),
        ),
        ("Latest whale", whale),
        ("Headlines", snapshot.news.len().to_string()),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), Cell::new(value)]);
    }
    table
}
