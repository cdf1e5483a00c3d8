//! Consensus pick computation.
//!
//! The core of the engine: reduces a flat sequence of per-bookmaker
//! offers to ranked consensus picks, and derives the filtered views
//! (locks, value bets, top pick) consumed by presentation code.
//!
//! Everything in this module is pure — no I/O, no shared state. The
//! fetch layer produces `RawOffer`s and the board caches the results;
//! this module only transforms.

pub mod aggregate;
pub mod parlay;
pub mod views;

pub use aggregate::{aggregate, implied_probability, normalize_player, rank, MIN_CONSENSUS_SOURCES};
pub use parlay::{american_to_decimal, parlay_odds, parlay_payout};
pub use views::{edge, filter_locks, filter_value, top_pick, LOCK_MIN_SOURCES, VALUE_MIN_EDGE};
