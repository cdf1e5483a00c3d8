//! balldontlie.io NBA statistics integration.
//!
//! Looks a player up by name, pulls their recent box scores, and
//! reports how often the pick's side of the line actually hit.
//!
//! API docs: https://docs.balldontlie.io/
//! Base URL: https://api.balldontlie.io/v1
//! Auth: `Authorization` header. NBA coverage only.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::StatsProvider;
use crate::types::{PlayerForm, PropCategory, Side, Sport};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://api.balldontlie.io/v1";
const SOURCE_NAME: &str = "balldontlie";

/// How many recent games to sample.
const RECENT_GAMES: u32 = 10;

/// Fewer sampled games than this and the form signal is noise.
const MIN_GAMES: usize = 5;

const REQUEST_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// API response types (balldontlie JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PlayerSearchResponse {
    #[serde(default)]
    data: Vec<PlayerRow>,
}

#[derive(Debug, Deserialize)]
struct PlayerRow {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    data: Vec<GameLine>,
}

/// One game's box-score line. Only the categories we screen on.
#[derive(Debug, Default, Deserialize)]
struct GameLine {
    #[serde(default)]
    pts: Option<f64>,
    #[serde(default)]
    reb: Option<f64>,
    #[serde(default)]
    ast: Option<f64>,
    #[serde(default)]
    fg3m: Option<f64>,
    #[serde(default)]
    stl: Option<f64>,
    #[serde(default)]
    blk: Option<f64>,
}

impl GameLine {
    /// Value of the stat backing a prop category, if we track it.
    fn value_for(&self, prop: &PropCategory) -> Option<f64> {
        let field = match prop {
            PropCategory::Points => self.pts,
            PropCategory::Rebounds => self.reb,
            PropCategory::Assists => self.ast,
            PropCategory::ThreePointers => self.fg3m,
            PropCategory::Steals => self.stl,
            PropCategory::Blocks => self.blk,
            _ => return None,
        };
        // A missing box-score cell reads as zero, same as a DNP line.
        Some(field.unwrap_or(0.0))
    }

    /// Whether this provider tracks a stat for the prop at all.
    fn covers(prop: &PropCategory) -> bool {
        matches!(
            prop,
            PropCategory::Points
                | PropCategory::Rebounds
                | PropCategory::Assists
                | PropCategory::ThreePointers
                | PropCategory::Steals
                | PropCategory::Blocks
        )
    }
}

// ---------------------------------------------------------------------------
// Form computation
// ---------------------------------------------------------------------------

/// Compute the form summary over sampled stat values.
///
/// A game "hits" when the value clears the line on the pick's side
/// (strictly — a push counts as a miss either way).
fn compute_form(values: &[f64], line: f64, side: Side) -> PlayerForm {
    let hits = values
        .iter()
        .filter(|v| match side {
            Side::Over => **v > line,
            Side::Under => **v < line,
            Side::ToWin => false,
        })
        .count();

    let average = values.iter().sum::<f64>() / values.len() as f64;

    PlayerForm {
        hit_rate: hits as f64 / values.len() as f64 * 100.0,
        average,
        games: values.len(),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// balldontlie stats client.
pub struct BallDontLieClient {
    http: Client,
    api_key: String,
    /// Season year to sample box scores from.
    season: u32,
}

impl BallDontLieClient {
    pub fn new(api_key: String, season: u32) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("LOCKSMITH/0.1.0")
            .build()
            .context("Failed to build HTTP client for balldontlie")?;

        Ok(Self { http, api_key, season })
    }

    /// Resolve a player name to the provider's player ID.
    /// Returns None when the search comes back empty.
    async fn find_player(&self, name: &str) -> Result<Option<i64>> {
        let resp = self
            .http
            .get(format!("{BASE_URL}/players"))
            .header("Authorization", &self.api_key)
            .query(&[("search", name)])
            .send()
            .await
            .context("balldontlie player search failed")?;

        if !resp.status().is_success() {
            debug!(player = name, status = %resp.status(), "Player search non-success");
            return Ok(None);
        }

        let body: PlayerSearchResponse = resp
            .json()
            .await
            .context("Failed to parse balldontlie player search")?;

        Ok(body.data.first().map(|p| p.id))
    }

    /// Fetch the player's recent game lines for the configured season.
    async fn recent_games(&self, player_id: i64) -> Result<Vec<GameLine>> {
        let resp = self
            .http
            .get(format!("{BASE_URL}/stats"))
            .header("Authorization", &self.api_key)
            .query(&[
                ("player_ids[]", player_id.to_string()),
                ("per_page", RECENT_GAMES.to_string()),
                ("seasons[]", self.season.to_string()),
            ])
            .send()
            .await
            .context("balldontlie stats fetch failed")?;

        if !resp.status().is_success() {
            debug!(player_id, status = %resp.status(), "Stats fetch non-success");
            return Ok(Vec::new());
        }

        let body: StatsResponse = resp
            .json()
            .await
            .context("Failed to parse balldontlie stats response")?;

        Ok(body.data)
    }
}

// ---------------------------------------------------------------------------
// StatsProvider trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl StatsProvider for BallDontLieClient {
    async fn fetch_form(
        &self,
        sport: Sport,
        player: &str,
        prop: &PropCategory,
        line: f64,
        side: Side,
    ) -> Result<Option<PlayerForm>> {
        // NBA box scores only; anything else has no form signal here.
        if sport != Sport::Nba || side == Side::ToWin || !GameLine::covers(prop) {
            return Ok(None);
        }

        let Some(player_id) = self.find_player(player).await? else {
            debug!(player, "No balldontlie match for player");
            return Ok(None);
        };

        let games = self.recent_games(player_id).await?;
        if games.len() < MIN_GAMES {
            debug!(player, games = games.len(), "Too few recent games for form");
            return Ok(None);
        }

        let values: Vec<f64> = games
            .iter()
            .filter_map(|g| g.value_for(prop))
            .collect();
        if values.len() < MIN_GAMES {
            return Ok(None);
        }

        Ok(Some(compute_form(&values, line, side)))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
