//! Odds feed integrations.
//!
//! Defines the `OddsFeed` trait and provides the implementation for
//! The Odds API (the-odds-api.com), the engine's line source.

pub mod theoddsapi;

use async_trait::async_trait;

use crate::types::{LocksmithError, RawOffer, Sport};

/// Abstraction over bookmaker odds providers.
///
/// Implementors fetch every currently-quoted player prop line for a
/// sport and flatten them into `RawOffer`s. Ordinary "no data"
/// conditions (no games today, no bookmakers on an event) are empty
/// results, never errors; authorization rejection and whole-feed
/// transport failure are distinct error kinds so callers can tell
/// "no picks" from "service unavailable".
#[async_trait]
pub trait OddsFeed: Send + Sync {
    /// Fetch all current offers for a sport.
    async fn fetch_offers(&self, sport: Sport) -> Result<Vec<RawOffer>, LocksmithError>;

    /// Feed name for logging and identification.
    fn name(&self) -> &str;
}
