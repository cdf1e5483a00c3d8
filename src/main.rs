//! LOCKSMITH — Consensus Sports-Betting Picks Engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! warms the membership store, and runs the refresh→aggregate→publish
//! loop with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use locksmith::board::PickBoard;
use locksmith::config;
use locksmith::consensus;
use locksmith::feeds::theoddsapi::TheOddsApiClient;
use locksmith::llm::anthropic::AnthropicClient;
use locksmith::llm::{self, ChatModel};
use locksmith::membership::MembershipStore;
use locksmith::promo;
use locksmith::stats::balldontlie::BallDontLieClient;
use locksmith::stats::StatsProvider;
use locksmith::types::{format_american, ConsensusPick, LocksmithError, Sport};

const BANNER: &str = r#"
 _     ___   ____ _  ______  __  __ ___ _____ _   _
| |   / _ \ / ___| |/ / ___||  \/  |_ _|_   _| | | |
| |  | | | | |   | ' /\___ \| |\/| || |  | | | |_| |
| |__| |_| | |___| . \ ___) | |  | || |  | | |  _  |
|_____\___/ \____|_|\_\____/|_|  |_|___| |_| |_| |_|

  Consensus Picks Engine
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        engine_name = %cfg.engine.name,
        refresh_interval_secs = cfg.engine.refresh_interval_secs,
        cache_ttl_secs = cfg.engine.cache_ttl_secs,
        sports = ?cfg.engine.sports,
        "LOCKSMITH starting up"
    );

    let sports = cfg.sports()?;

    // -- Membership store --------------------------------------------------

    // The chat layer gates commands on this; we own the schema and report
    // how many subscriptions are live.
    let membership = MembershipStore::open(cfg.membership.db_path.as_deref()).await?;
    let active_members = membership.active_count().await.unwrap_or(0);
    info!(active_members, "Membership store ready");

    // -- Odds feed ---------------------------------------------------------

    let odds_key = config::AppConfig::resolve_env(&cfg.feed.api_key_env)?;
    let feed = Arc::new(TheOddsApiClient::new(odds_key)?);

    // -- Stats screen ------------------------------------------------------

    let stats: Option<Arc<dyn StatsProvider>> = if cfg.stats.enabled {
        let key = cfg
            .stats
            .api_key_env
            .as_deref()
            .and_then(|env| std::env::var(env).ok());
        match key {
            Some(key) => Some(Arc::new(BallDontLieClient::new(key, cfg.stats.season)?)),
            None => {
                warn!("Stats screening enabled but no API key set — picks go out unscreened");
                None
            }
        }
    } else {
        None
    };

    let board = PickBoard::new(
        feed,
        stats,
        Duration::from_secs(cfg.engine.cache_ttl_secs),
    );

    // -- Recap model -------------------------------------------------------

    let recap_model: Option<Box<dyn ChatModel>> = if cfg.llm.enabled {
        match std::env::var(&cfg.llm.api_key_env) {
            Ok(key) if !key.is_empty() => {
                info!(model = %cfg.llm.model, "Recap model enabled");
                Some(Box::new(AnthropicClient::new(
                    key,
                    Some(cfg.llm.model.clone()),
                    Some(cfg.llm.max_tokens),
                )?))
            }
            _ => {
                warn!("LLM recap enabled but no API key set — recaps disabled");
                None
            }
        }
    } else {
        None
    };

    // -- Main loop ---------------------------------------------------------

    let mut interval =
        tokio::time::interval(Duration::from_secs(cfg.engine.refresh_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.engine.refresh_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = run_cycle(&board, &sports, recap_model.as_deref()).await {
                    error!(error = %e, "Cycle failed — continuing to next");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("LOCKSMITH shut down cleanly.");
    Ok(())
}

/// Refresh every configured sport's board and publish the results to
/// the log: ranked picks, locks, value bets, the pick of the day, a
/// suggested parlay, and the optional written recap.
async fn run_cycle(
    board: &PickBoard,
    sports: &[Sport],
    recap_model: Option<&dyn ChatModel>,
) -> Result<()> {
    let mut all_picks: Vec<ConsensusPick> = Vec::new();

    for sport in sports {
        match board.picks(*sport).await {
            Ok(picks) => {
                info!(sport = %sport, "{}", promo::board_summary(*sport, &picks));
                if picks.is_empty() {
                    continue;
                }

                let locks = consensus::filter_locks(&picks, consensus::LOCK_MIN_SOURCES);
                for lock in &locks {
                    info!(sport = %sport, "LOCK: {lock}");
                }

                let value = consensus::filter_value(&picks, consensus::VALUE_MIN_EDGE)?;
                for (pick, edge) in &value {
                    info!(sport = %sport, edge = format!("{edge:+.1}"), "Value bet: {pick}");
                }

                all_picks.extend(picks);
            }
            Err(e @ LocksmithError::AuthRejected { .. }) => {
                // Distinct from "no games today" — the feed is refusing us.
                error!(sport = %sport, error = %e, "{}", promo::SERVICE_UNAVAILABLE);
            }
            Err(e) => {
                warn!(sport = %sport, error = %e, "{}", promo::SERVICE_UNAVAILABLE);
            }
        }
    }

    if all_picks.is_empty() {
        return Ok(());
    }

    consensus::rank(&mut all_picks);

    if let Some(top) = consensus::top_pick(&all_picks) {
        info!("Pick of the day: {top}");
        info!("{}", promo::hype_message(top));
    }

    let legs: Vec<i32> = all_picks.iter().take(3).map(|p| p.avg_odds).collect();
    if legs.len() >= 2 {
        match consensus::parlay_odds(&legs) {
            Ok(odds) => info!(
                odds = %format_american(odds),
                pays = format!("${:.2} on $100", consensus::parlay_payout(odds, 100.0)),
                legs = legs.len(),
                "Suggested parlay"
            ),
            Err(e) => warn!(error = %e, "Parlay suggestion skipped"),
        }
    }

    if let Some(model) = recap_model {
        let head = &all_picks[..all_picks.len().min(5)];
        match llm::write_recap(model, head).await {
            Ok(recap) => info!(recap = %recap, "Daily recap"),
            Err(e) => warn!(error = %e, "Recap generation failed"),
        }
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("locksmith=info"));

    let json_logging = std::env::var("LOCKSMITH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
