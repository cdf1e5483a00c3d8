//! Per-sport pick board.
//!
//! Caches each sport's consensus picks for a bounded window so repeated
//! requests inside the window don't re-spend provider quota. The
//! aggregation itself stays pure — this is the only stateful
//! collaborator, and it enforces at most one in-flight refresh per
//! sport: a per-sport async mutex is held across the whole fetch, so
//! concurrent requests for the same sport wait and then read the entry
//! the first one wrote.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::consensus;
use crate::feeds::OddsFeed;
use crate::stats::{self, StatsProvider};
use crate::types::{ConsensusPick, LocksmithError, Sport};

/// How long a cached pick list stays fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cached state for one sport.
struct Slot {
    picks: Vec<ConsensusPick>,
    fetched_at: Option<Instant>,
}

impl Slot {
    fn empty() -> Self {
        Slot { picks: Vec::new(), fetched_at: None }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

/// Per-sport cached pick lists over an odds feed, optionally screened
/// against a stats provider.
pub struct PickBoard {
    feed: Arc<dyn OddsFeed>,
    stats: Option<Arc<dyn StatsProvider>>,
    ttl: Duration,
    slots: std::sync::Mutex<HashMap<Sport, Arc<Mutex<Slot>>>>,
}

impl PickBoard {
    pub fn new(
        feed: Arc<dyn OddsFeed>,
        stats: Option<Arc<dyn StatsProvider>>,
        ttl: Duration,
    ) -> Self {
        Self {
            feed,
            stats,
            ttl,
            slots: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Current picks for a sport, refreshing first when the cached entry
    /// is stale or absent. A failed refresh surfaces the error and
    /// leaves any previous entry untouched.
    pub async fn picks(&self, sport: Sport) -> Result<Vec<ConsensusPick>, LocksmithError> {
        let slot = self.slot(sport);
        let mut guard = slot.lock().await;

        if guard.is_fresh(self.ttl) {
            debug!(sport = %sport, picks = guard.picks.len(), "Serving cached picks");
            return Ok(guard.picks.clone());
        }

        self.refresh_slot(sport, &mut guard).await?;
        Ok(guard.picks.clone())
    }

    /// Refresh a sport's picks regardless of cache age. Returns the new
    /// pick count.
    pub async fn refresh(&self, sport: Sport) -> Result<usize, LocksmithError> {
        let slot = self.slot(sport);
        let mut guard = slot.lock().await;
        self.refresh_slot(sport, &mut guard).await?;
        Ok(guard.picks.len())
    }

    /// The per-sport slot, created on first use.
    fn slot(&self, sport: Sport) -> Arc<Mutex<Slot>> {
        let mut slots = self.slots.lock().expect("slot map poisoned");
        slots
            .entry(sport)
            .or_insert_with(|| Arc::new(Mutex::new(Slot::empty())))
            .clone()
    }

    async fn refresh_slot(
        &self,
        sport: Sport,
        guard: &mut Slot,
    ) -> Result<(), LocksmithError> {
        let offers = self.feed.fetch_offers(sport).await?;
        let mut picks = consensus::aggregate(&offers)?;

        if let Some(stats) = &self.stats {
            let before = picks.len();
            picks = stats::screen_picks(stats.as_ref(), sport, picks).await;
            debug!(
                sport = %sport,
                before,
                after = picks.len(),
                "Picks screened against recent form"
            );
        }

        info!(
            sport = %sport,
            offers = offers.len(),
            picks = picks.len(),
            "Pick board refreshed"
        );

        guard.picks = picks;
        guard.fetched_at = Some(Instant::now());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PropCategory, RawOffer, Side};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn offers() -> Vec<RawOffer> {
        vec![
            RawOffer {
                player: "Jayson Tatum".to_string(),
                prop: PropCategory::Points,
                line: 27.5,
                side: Side::Over,
                odds: -110,
                bookmaker: "DraftKings".to_string(),
                game: "Celtics @ Knicks".to_string(),
            },
            RawOffer {
                player: "Jayson Tatum".to_string(),
                prop: PropCategory::Points,
                line: 27.5,
                side: Side::Over,
                odds: -120,
                bookmaker: "FanDuel".to_string(),
                game: "Celtics @ Knicks".to_string(),
            },
        ]
    }

    /// Feed that counts calls and can be told to start failing.
    struct ScriptedFeed {
        calls: AtomicUsize,
        fail_from_call: usize,
        delay: Duration,
    }

    impl ScriptedFeed {
        fn ok() -> Self {
            Self { calls: AtomicUsize::new(0), fail_from_call: usize::MAX, delay: Duration::ZERO }
        }

        fn failing_from(call: usize) -> Self {
            Self { calls: AtomicUsize::new(0), fail_from_call: call, delay: Duration::ZERO }
        }

        fn slow(delay: Duration) -> Self {
            Self { calls: AtomicUsize::new(0), fail_from_call: usize::MAX, delay }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OddsFeed for ScriptedFeed {
        async fn fetch_offers(&self, _sport: Sport) -> Result<Vec<RawOffer>, LocksmithError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if call >= self.fail_from_call {
                return Err(LocksmithError::Transport {
                    feed: "scripted".to_string(),
                    message: "down".to_string(),
                });
            }
            Ok(offers())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_served_from_cache() {
        let feed = Arc::new(ScriptedFeed::ok());
        let board = PickBoard::new(feed.clone(), None, Duration::from_secs(300));

        let first = board.picks(Sport::Nba).await.unwrap();
        let second = board.picks(Sport::Nba).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(feed.call_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_refetched() {
        let feed = Arc::new(ScriptedFeed::ok());
        let board = PickBoard::new(feed.clone(), None, Duration::ZERO);

        board.picks(Sport::Nba).await.unwrap();
        board.picks(Sport::Nba).await.unwrap();

        assert_eq!(feed.call_count(), 2);
    }

    #[tokio::test]
    async fn test_sports_cache_independently() {
        let feed = Arc::new(ScriptedFeed::ok());
        let board = PickBoard::new(feed.clone(), None, Duration::from_secs(300));

        board.picks(Sport::Nba).await.unwrap();
        board.picks(Sport::Nhl).await.unwrap();

        assert_eq!(feed.call_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_ttl() {
        let feed = Arc::new(ScriptedFeed::ok());
        let board = PickBoard::new(feed.clone(), None, Duration::from_secs(300));

        board.picks(Sport::Nba).await.unwrap();
        let count = board.refresh(Sport::Nba).await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(feed.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_picks() {
        let feed = Arc::new(ScriptedFeed::failing_from(1));
        let board = PickBoard::new(feed.clone(), None, Duration::from_secs(300));

        let first = board.picks(Sport::Nba).await.unwrap();
        assert_eq!(first.len(), 1);

        // Forced refresh hits the feed again, which is now down.
        let err = board.refresh(Sport::Nba).await.unwrap_err();
        assert!(matches!(err, LocksmithError::Transport { .. }));

        // The previous entry survives the failed refresh.
        let still_cached = board.picks(Sport::Nba).await.unwrap();
        assert_eq!(still_cached.len(), 1);
        assert_eq!(feed.call_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_single_refresh() {
        let feed = Arc::new(ScriptedFeed::slow(Duration::from_millis(50)));
        let board = Arc::new(PickBoard::new(feed.clone(), None, Duration::from_secs(300)));

        let a = tokio::spawn({
            let board = board.clone();
            async move { board.picks(Sport::Nba).await }
        });
        let b = tokio::spawn({
            let board = board.clone();
            async move { board.picks(Sport::Nba).await }
        });

        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(ra.unwrap().unwrap().len(), 1);
        assert_eq!(rb.unwrap().unwrap().len(), 1);

        // Only one of the two racing requests hit the feed.
        assert_eq!(feed.call_count(), 1);
    }
}
