//! The Odds API integration.
//!
//! Fetches upcoming events and their per-bookmaker player prop odds,
//! flattening the nested event → bookmaker → market → outcome payload
//! into the engine's `RawOffer` shape.
//!
//! API docs: https://the-odds-api.com/liveapi/guides/v4/
//! Base URL: https://api.the-odds-api.com/v4
//! Auth: `apiKey` query parameter. Quota is per-request, so the fetch
//! caps how many events it walks per cycle.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::OddsFeed;
use crate::types::{LocksmithError, PropCategory, RawOffer, Side, Sport};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://api.the-odds-api.com/v4";
const FEED_NAME: &str = "the-odds-api";

/// Per-call timeout for provider requests.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Only this many upcoming events are priced per aggregation cycle.
/// Intentional truncation — each event costs a detail request against
/// the provider quota.
const MAX_EVENTS_PER_CYCLE: usize = 5;

/// Defaults for partial upstream payloads. The provider owns the data;
/// we tolerate holes rather than dropping whole markets.
const DEFAULT_PLAYER: &str = "Unknown";
const DEFAULT_LINE: f64 = 0.0;
const DEFAULT_PRICE: i32 = -110;

/// Placeholder line for moneyline entries, which have no threshold.
const MONEYLINE_LINE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Market-key mapping
// ---------------------------------------------------------------------------

/// Provider market keys requested for each sport.
fn markets_param(sport: Sport) -> &'static str {
    match sport {
        Sport::Nba => {
            "player_points,player_rebounds,player_assists,player_threes,player_steals,player_blocks,h2h"
        }
        Sport::Nfl => "player_pass_yds,player_rush_yds,player_receptions,h2h",
        Sport::Mlb => "batter_hits,batter_runs_scored,batter_rbis,batter_total_bases,h2h",
        Sport::Nhl => "player_goals,player_shots_on_goal,h2h",
    }
}

/// Map a provider market key to a display prop category.
///
/// Unrecognized keys pass through verbatim so a new provider market
/// degrades into an oddly-named category instead of vanishing.
fn prop_for_market(sport: Sport, key: &str) -> PropCategory {
    match (sport, key) {
        (_, "h2h") => PropCategory::ToWin,
        (Sport::Nba, "player_points") => PropCategory::Points,
        (Sport::Nba, "player_rebounds") => PropCategory::Rebounds,
        (Sport::Nba, "player_assists") => PropCategory::Assists,
        (Sport::Nba, "player_threes") => PropCategory::ThreePointers,
        (Sport::Nba, "player_steals") => PropCategory::Steals,
        (Sport::Nba, "player_blocks") => PropCategory::Blocks,
        (Sport::Nfl, "player_pass_yds") => PropCategory::PassYards,
        (Sport::Nfl, "player_rush_yds") => PropCategory::RushYards,
        (Sport::Nfl, "player_receptions") => PropCategory::Receptions,
        (Sport::Mlb, "batter_hits") => PropCategory::Hits,
        (Sport::Mlb, "batter_runs_scored") => PropCategory::Runs,
        (Sport::Mlb, "batter_rbis") => PropCategory::Rbis,
        (Sport::Mlb, "batter_total_bases") => PropCategory::TotalBases,
        (Sport::Nhl, "player_goals") => PropCategory::Goals,
        (Sport::Nhl, "player_shots_on_goal") => PropCategory::ShotsOnGoal,
        (_, other) => PropCategory::Other(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// API response types (The Odds API JSON → Rust)
// ---------------------------------------------------------------------------

/// One upcoming event from `/v4/sports/{sport}/events`.
#[derive(Debug, Deserialize)]
struct ApiEvent {
    id: String,
    #[serde(default)]
    home_team: Option<String>,
    #[serde(default)]
    away_team: Option<String>,
}

/// Event odds payload from `/v4/sports/{sport}/events/{id}/odds`.
/// Only the fields we need are deserialized.
#[derive(Debug, Deserialize)]
struct ApiEventOdds {
    #[serde(default)]
    home_team: Option<String>,
    #[serde(default)]
    away_team: Option<String>,
    #[serde(default)]
    bookmakers: Vec<ApiBookmaker>,
}

#[derive(Debug, Deserialize)]
struct ApiBookmaker {
    title: String,
    #[serde(default)]
    markets: Vec<ApiMarket>,
}

#[derive(Debug, Deserialize)]
struct ApiMarket {
    key: String,
    #[serde(default)]
    outcomes: Vec<ApiOutcome>,
}

#[derive(Debug, Deserialize)]
struct ApiOutcome {
    /// Side for props ("Over"/"Under"), team name for moneylines.
    #[serde(default)]
    name: Option<String>,
    /// Player name for props.
    #[serde(default)]
    description: Option<String>,
    /// American odds.
    #[serde(default)]
    price: Option<i32>,
    /// Line threshold.
    #[serde(default)]
    point: Option<f64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// The Odds API feed client.
pub struct TheOddsApiClient {
    http: Client,
    api_key: String,
}

impl TheOddsApiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("LOCKSMITH/0.1.0")
            .build()
            .context("Failed to build HTTP client for The Odds API")?;

        Ok(Self { http, api_key })
    }

    // -- Internal helpers ------------------------------------------------

    /// Issue one GET against the provider, mapping auth rejection and
    /// transport failure to their distinct error kinds.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        sport: Sport,
    ) -> Result<T, LocksmithError> {
        let resp = self
            .http
            .get(url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", "us"),
                ("markets", markets_param(sport)),
                ("oddsFormat", "american"),
            ])
            .send()
            .await
            .map_err(|e| LocksmithError::Transport {
                feed: FEED_NAME.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(LocksmithError::AuthRejected {
                feed: FEED_NAME.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LocksmithError::Transport {
                feed: FEED_NAME.to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        resp.json().await.map_err(|e| LocksmithError::Transport {
            feed: FEED_NAME.to_string(),
            message: format!("response decode failed: {e}"),
        })
    }

    /// List upcoming events for a sport.
    async fn list_events(&self, sport: Sport) -> Result<Vec<ApiEvent>, LocksmithError> {
        let url = format!("{BASE_URL}/sports/{}/events", sport.api_key());
        debug!(url = %url, sport = %sport, "Listing events");
        self.get_json(&url, sport).await
    }

    /// Fetch one event's odds and flatten them.
    async fn event_offers(
        &self,
        sport: Sport,
        event_id: &str,
    ) -> Result<Vec<RawOffer>, LocksmithError> {
        let url = format!(
            "{BASE_URL}/sports/{}/events/{}/odds",
            sport.api_key(),
            urlencoding::encode(event_id),
        );
        let payload: ApiEventOdds = self.get_json(&url, sport).await?;
        Ok(flatten_event(sport, &payload))
    }
}

/// Flatten one event payload into offers, one per
/// (bookmaker, market, outcome) triple.
///
/// Missing optional fields default rather than dropping the outcome —
/// the provider controls the payload shape, not us.
fn flatten_event(sport: Sport, payload: &ApiEventOdds) -> Vec<RawOffer> {
    let game = format!(
        "{} @ {}",
        payload.away_team.as_deref().unwrap_or(DEFAULT_PLAYER),
        payload.home_team.as_deref().unwrap_or(DEFAULT_PLAYER),
    );

    let mut offers = Vec::new();

    for bookmaker in &payload.bookmakers {
        for market in &bookmaker.markets {
            let prop = prop_for_market(sport, &market.key);
            let moneyline = market.key == "h2h";

            for outcome in &market.outcomes {
                let (player, side, line) = if moneyline {
                    // Moneyline: the outcome name is the team, there is
                    // no line to clear.
                    let team = outcome
                        .name
                        .as_deref()
                        .unwrap_or(DEFAULT_PLAYER)
                        .to_string();
                    (team, Side::ToWin, MONEYLINE_LINE)
                } else {
                    let player = outcome
                        .description
                        .as_deref()
                        .unwrap_or(DEFAULT_PLAYER)
                        .to_string();
                    let side = outcome
                        .name
                        .as_deref()
                        .and_then(|n| n.parse::<Side>().ok())
                        .unwrap_or(Side::Over);
                    let line = outcome.point.unwrap_or(DEFAULT_LINE);
                    (player, side, line)
                };

                offers.push(RawOffer {
                    player,
                    prop: prop.clone(),
                    line,
                    side,
                    odds: outcome.price.unwrap_or(DEFAULT_PRICE),
                    bookmaker: bookmaker.title.clone(),
                    game: game.clone(),
                });
            }
        }
    }

    offers
}

// ---------------------------------------------------------------------------
// OddsFeed trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl OddsFeed for TheOddsApiClient {
    /// Fetch current offers for a sport.
    ///
    /// Walks the first [`MAX_EVENTS_PER_CYCLE`] upcoming events, one
    /// detail request at a time. A transport failure on one event means
    /// zero offers for that event and the walk continues; authorization
    /// rejection aborts the whole sport immediately.
    async fn fetch_offers(&self, sport: Sport) -> Result<Vec<RawOffer>, LocksmithError> {
        let events = self.list_events(sport).await?;
        info!(sport = %sport, events = events.len(), "Events listed");

        let mut offers = Vec::new();

        for event in events.iter().take(MAX_EVENTS_PER_CYCLE) {
            match self.event_offers(sport, &event.id).await {
                Ok(batch) => {
                    debug!(
                        event_id = %event.id,
                        home = event.home_team.as_deref().unwrap_or("?"),
                        away = event.away_team.as_deref().unwrap_or("?"),
                        offers = batch.len(),
                        "Event priced"
                    );
                    offers.extend(batch);
                }
                Err(e @ LocksmithError::AuthRejected { .. }) => {
                    // Credentials are being refused — stop burning quota.
                    return Err(e);
                }
                Err(e) => {
                    warn!(event_id = %event.id, error = %e, "Event fetch failed, continuing");
                }
            }
        }

        info!(sport = %sport, offers = offers.len(), "Raw offers collected");
        Ok(offers)
    }

    fn name(&self) -> &str {
        FEED_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn event_odds(json: serde_json::Value) -> ApiEventOdds {
        serde_json::from_value(json).unwrap()
    }

    // -- Market mapping tests --

    #[test]
    fn test_prop_for_market_nba() {
        assert_eq!(prop_for_market(Sport::Nba, "player_points"), PropCategory::Points);
        assert_eq!(prop_for_market(Sport::Nba, "player_threes"), PropCategory::ThreePointers);
        assert_eq!(prop_for_market(Sport::Nba, "player_blocks"), PropCategory::Blocks);
    }

    #[test]
    fn test_prop_for_market_other_sports() {
        assert_eq!(prop_for_market(Sport::Nfl, "player_pass_yds"), PropCategory::PassYards);
        assert_eq!(prop_for_market(Sport::Mlb, "batter_total_bases"), PropCategory::TotalBases);
        assert_eq!(prop_for_market(Sport::Nhl, "player_shots_on_goal"), PropCategory::ShotsOnGoal);
    }

    #[test]
    fn test_prop_for_market_h2h_any_sport() {
        for sport in Sport::ALL {
            assert_eq!(prop_for_market(*sport, "h2h"), PropCategory::ToWin);
        }
    }

    #[test]
    fn test_prop_for_market_unknown_passes_through() {
        assert_eq!(
            prop_for_market(Sport::Nba, "player_double_double"),
            PropCategory::Other("player_double_double".to_string()),
        );
        // Keys are per-sport: an NBA key seen under NFL is unknown there.
        assert_eq!(
            prop_for_market(Sport::Nfl, "player_points"),
            PropCategory::Other("player_points".to_string()),
        );
    }

    #[test]
    fn test_markets_param_matches_mapping() {
        for sport in Sport::ALL {
            for key in markets_param(*sport).split(',') {
                let prop = prop_for_market(*sport, key);
                assert!(
                    !matches!(prop, PropCategory::Other(_)),
                    "requested market {key} for {sport} has no mapping",
                );
            }
        }
    }

    // -- Flattening tests --

    #[test]
    fn test_flatten_full_payload() {
        let payload = event_odds(serde_json::json!({
            "home_team": "New York Knicks",
            "away_team": "Boston Celtics",
            "bookmakers": [{
                "title": "DraftKings",
                "markets": [{
                    "key": "player_points",
                    "outcomes": [
                        {"name": "Over", "description": "Jayson Tatum", "price": -115, "point": 27.5},
                        {"name": "Under", "description": "Jayson Tatum", "price": -105, "point": 27.5},
                    ],
                }],
            }],
        }));

        let offers = flatten_event(Sport::Nba, &payload);
        assert_eq!(offers.len(), 2);

        assert_eq!(offers[0].player, "Jayson Tatum");
        assert_eq!(offers[0].prop, PropCategory::Points);
        assert_eq!(offers[0].side, Side::Over);
        assert_eq!(offers[0].line, 27.5);
        assert_eq!(offers[0].odds, -115);
        assert_eq!(offers[0].bookmaker, "DraftKings");
        assert_eq!(offers[0].game, "Boston Celtics @ New York Knicks");

        assert_eq!(offers[1].side, Side::Under);
    }

    #[test]
    fn test_flatten_one_offer_per_book_market_outcome() {
        let payload = event_odds(serde_json::json!({
            "home_team": "H",
            "away_team": "A",
            "bookmakers": [
                {
                    "title": "DraftKings",
                    "markets": [
                        {"key": "player_points", "outcomes": [
                            {"name": "Over", "description": "P1", "price": -110, "point": 20.5},
                        ]},
                        {"key": "player_assists", "outcomes": [
                            {"name": "Over", "description": "P1", "price": -110, "point": 6.5},
                        ]},
                    ],
                },
                {
                    "title": "FanDuel",
                    "markets": [
                        {"key": "player_points", "outcomes": [
                            {"name": "Over", "description": "P1", "price": -112, "point": 20.5},
                        ]},
                    ],
                },
            ],
        }));

        let offers = flatten_event(Sport::Nba, &payload);
        assert_eq!(offers.len(), 3);
    }

    #[test]
    fn test_flatten_defaults_for_missing_fields() {
        let payload = event_odds(serde_json::json!({
            "bookmakers": [{
                "title": "DraftKings",
                "markets": [{
                    "key": "player_points",
                    "outcomes": [{}],
                }],
            }],
        }));

        let offers = flatten_event(Sport::Nba, &payload);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].player, "Unknown");
        assert_eq!(offers[0].line, 0.0);
        assert_eq!(offers[0].odds, -110);
        assert_eq!(offers[0].side, Side::Over);
        assert_eq!(offers[0].game, "Unknown @ Unknown");
    }

    #[test]
    fn test_flatten_moneyline() {
        let payload = event_odds(serde_json::json!({
            "home_team": "New York Knicks",
            "away_team": "Boston Celtics",
            "bookmakers": [{
                "title": "BetMGM",
                "markets": [{
                    "key": "h2h",
                    "outcomes": [
                        {"name": "Boston Celtics", "price": -140},
                        {"name": "New York Knicks", "price": 120},
                    ],
                }],
            }],
        }));

        let offers = flatten_event(Sport::Nba, &payload);
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].player, "Boston Celtics");
        assert_eq!(offers[0].prop, PropCategory::ToWin);
        assert_eq!(offers[0].side, Side::ToWin);
        assert_eq!(offers[0].line, 1.0);
        assert_eq!(offers[1].odds, 120);
    }

    #[test]
    fn test_flatten_unknown_market_key_kept() {
        let payload = event_odds(serde_json::json!({
            "home_team": "H",
            "away_team": "A",
            "bookmakers": [{
                "title": "DraftKings",
                "markets": [{
                    "key": "player_double_double",
                    "outcomes": [
                        {"name": "Over", "description": "P1", "price": -130, "point": 0.5},
                    ],
                }],
            }],
        }));

        let offers = flatten_event(Sport::Nba, &payload);
        assert_eq!(offers.len(), 1);
        assert_eq!(
            offers[0].prop,
            PropCategory::Other("player_double_double".to_string()),
        );
    }

    #[test]
    fn test_flatten_no_bookmakers_is_empty_not_error() {
        let payload = event_odds(serde_json::json!({
            "home_team": "H",
            "away_team": "A",
            "bookmakers": [],
        }));
        assert!(flatten_event(Sport::Nba, &payload).is_empty());
    }

    // -- Client construction --

    #[test]
    fn test_new_client() {
        let client = TheOddsApiClient::new("test-key".to_string());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().name(), "the-odds-api");
    }
}
