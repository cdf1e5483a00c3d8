//! Shared types for the LOCKSMITH engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that feed, stats, and board
//! modules can depend on them without circular references.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Sport
// ---------------------------------------------------------------------------

/// Sports the engine can aggregate picks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sport {
    Nba,
    Nfl,
    Mlb,
    Nhl,
}

impl Sport {
    /// All supported sports (useful for iteration).
    pub const ALL: &'static [Sport] = &[Sport::Nba, Sport::Nfl, Sport::Mlb, Sport::Nhl];

    /// The Odds API sport key for this sport.
    pub fn api_key(&self) -> &'static str {
        match self {
            Sport::Nba => "basketball_nba",
            Sport::Nfl => "americanfootball_nfl",
            Sport::Mlb => "baseball_mlb",
            Sport::Nhl => "icehockey_nhl",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sport::Nba => write!(f, "NBA"),
            Sport::Nfl => write!(f, "NFL"),
            Sport::Mlb => write!(f, "MLB"),
            Sport::Nhl => write!(f, "NHL"),
        }
    }
}

/// Attempt to parse a string into a Sport (case-insensitive).
impl std::str::FromStr for Sport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nba" | "basketball" | "basketball_nba" => Ok(Sport::Nba),
            "nfl" | "football" | "americanfootball_nfl" => Ok(Sport::Nfl),
            "mlb" | "baseball" | "baseball_mlb" => Ok(Sport::Mlb),
            "nhl" | "hockey" | "icehockey_nhl" => Ok(Sport::Nhl),
            _ => Err(anyhow::anyhow!("Unknown sport: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Prop category
// ---------------------------------------------------------------------------

/// The statistical category a player prop is measured on.
///
/// Provider market keys that have no mapping are carried through as
/// `Other(raw_key)` so new markets degrade gracefully instead of
/// disappearing from the pick list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropCategory {
    Points,
    Rebounds,
    Assists,
    ThreePointers,
    Steals,
    Blocks,
    PassYards,
    RushYards,
    Receptions,
    Hits,
    Runs,
    Rbis,
    TotalBases,
    Goals,
    ShotsOnGoal,
    /// Moneyline-style market — the "prop" is winning the game outright.
    ToWin,
    /// Unrecognized provider market key, carried through verbatim.
    Other(String),
}

impl fmt::Display for PropCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropCategory::Points => write!(f, "Points"),
            PropCategory::Rebounds => write!(f, "Rebounds"),
            PropCategory::Assists => write!(f, "Assists"),
            PropCategory::ThreePointers => write!(f, "3-Pointers"),
            PropCategory::Steals => write!(f, "Steals"),
            PropCategory::Blocks => write!(f, "Blocks"),
            PropCategory::PassYards => write!(f, "Pass Yards"),
            PropCategory::RushYards => write!(f, "Rush Yards"),
            PropCategory::Receptions => write!(f, "Receptions"),
            PropCategory::Hits => write!(f, "Hits"),
            PropCategory::Runs => write!(f, "Runs"),
            PropCategory::Rbis => write!(f, "RBIs"),
            PropCategory::TotalBases => write!(f, "Total Bases"),
            PropCategory::Goals => write!(f, "Goals"),
            PropCategory::ShotsOnGoal => write!(f, "Shots on Goal"),
            PropCategory::ToWin => write!(f, "To Win"),
            PropCategory::Other(key) => write!(f, "{key}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which side of the line a wager takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Over,
    Under,
    /// Moneyline — no line to clear, the player/team just has to win.
    ToWin,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Over => write!(f, "Over"),
            Side::Under => write!(f, "Under"),
            Side::ToWin => write!(f, "To Win"),
        }
    }
}

/// Attempt to parse an outcome name into a Side (case-insensitive).
impl std::str::FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "over" | "more" => Ok(Side::Over),
            "under" | "less" => Ok(Side::Under),
            "to win" | "win" => Ok(Side::ToWin),
            _ => Err(anyhow::anyhow!("Unknown side: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw offer
// ---------------------------------------------------------------------------

/// One bookmaker's quoted line for one player prop outcome.
///
/// Constructed fresh on every fetch and discarded after consensus
/// computation — never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOffer {
    /// Player name as the provider spells it (free text, not an ID).
    pub player: String,
    pub prop: PropCategory,
    /// Numeric threshold. Moneyline entries use a placeholder of 1.
    pub line: f64,
    pub side: Side,
    /// American odds — signed, nonzero.
    pub odds: i32,
    pub bookmaker: String,
    /// Matchup label, e.g. "Celtics @ Knicks".
    pub game: String,
}

impl fmt::Display for RawOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} @ {} ({})",
            self.player,
            self.side,
            self.line,
            self.prop,
            format_american(self.odds),
            self.bookmaker,
        )
    }
}

/// Format American odds with the conventional explicit plus sign.
pub fn format_american(odds: i32) -> String {
    if odds > 0 {
        format!("+{odds}")
    } else {
        format!("{odds}")
    }
}

// ---------------------------------------------------------------------------
// Player form
// ---------------------------------------------------------------------------

/// Hit rate threshold (percent) above which recent form supports a pick.
pub const HOT_FORM_THRESHOLD: f64 = 65.0;

/// Recent-game performance summary for a player prop, from the stats API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerForm {
    /// Percentage of recent games in which the pick's side would have hit.
    pub hit_rate: f64,
    /// Average stat value over the sampled games.
    pub average: f64,
    /// Number of games sampled.
    pub games: usize,
}

impl PlayerForm {
    /// Whether recent form is strong enough to keep the pick.
    pub fn is_hot(&self) -> bool {
        self.hit_rate >= HOT_FORM_THRESHOLD
    }
}

impl fmt::Display for PlayerForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% hit rate over {} games (avg {:.1})",
            self.hit_rate, self.games, self.average,
        )
    }
}

// ---------------------------------------------------------------------------
// Consensus pick
// ---------------------------------------------------------------------------

/// The derived, de-duplicated recommendation for one (player, prop, side)
/// combination. Exists only for the duration of the response presenting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusPick {
    pub player: String,
    pub prop: PropCategory,
    /// Line from the first contributing offer.
    pub line: f64,
    pub side: Side,
    /// Distinct offers agreeing on this player+prop+side.
    pub source_count: usize,
    /// Mean of each source's implied win probability, percent in [0,100].
    pub avg_probability: f64,
    /// Mean of contributing American odds, rounded to nearest integer.
    /// Computed from the raw odds, NOT re-derived from `avg_probability`.
    pub avg_odds: i32,
    /// Matchup label carried from the first contributing offer.
    pub game: String,
    /// Contributing bookmaker names, in encounter order.
    pub bookmakers: Vec<String>,
    /// (min, max) of contributing lines when the books disagreed.
    /// `None` when every book quoted the same line.
    pub line_range: Option<(f64, f64)>,
    /// Recent-form annotation, when the stats screen ran for this pick.
    pub form: Option<PlayerForm>,
}

impl fmt::Display for ConsensusPick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} | {} avg across {} books | {:.1}% | {}",
            self.player,
            self.side,
            self.line,
            self.prop,
            format_american(self.avg_odds),
            self.source_count,
            self.avg_probability,
            self.game,
        )
    }
}

impl ConsensusPick {
    /// Helper to build a test/sample pick with sensible defaults.
    #[cfg(test)]
    pub fn sample() -> Self {
        ConsensusPick {
            player: "Jayson Tatum".to_string(),
            prop: PropCategory::Points,
            line: 27.5,
            side: Side::Over,
            source_count: 3,
            avg_probability: 55.2,
            avg_odds: -118,
            game: "Celtics @ Knicks".to_string(),
            bookmakers: vec![
                "DraftKings".to_string(),
                "FanDuel".to_string(),
                "BetMGM".to_string(),
            ],
            line_range: None,
            form: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for LOCKSMITH.
#[derive(Debug, thiserror::Error)]
pub enum LocksmithError {
    /// The odds provider rejected our credentials or quota. Surfaced so
    /// callers can show "service unavailable" instead of "no games today",
    /// and so we stop hitting a provider that is refusing us.
    #[error("Odds feed authorization rejected ({feed})")]
    AuthRejected { feed: String },

    #[error("Odds feed transport failure ({feed}): {message}")]
    Transport { feed: String, message: String },

    /// Zero is undefined in American odds notation.
    #[error("Invalid American odds value: {0}")]
    InvalidOdds(i32),

    #[error("Parlay must have 2-6 legs, got {0}")]
    ParlayLegs(usize),

    #[error("Stats provider error ({source_name}): {message}")]
    Stats { source_name: String, message: String },

    #[error("LLM error ({model}): {message}")]
    Llm { model: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
