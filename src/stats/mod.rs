//! Player statistics providers.
//!
//! Defines the `StatsProvider` trait and the recent-form screen that
//! cross-checks consensus picks against what the player has actually
//! been doing on the floor.

pub mod balldontlie;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::types::{ConsensusPick, PlayerForm, PropCategory, Side, Sport};

/// Abstraction over player statistics sources.
///
/// Implementors look up a player's recent games and report how often
/// the pick's side of the line would have hit. `Ok(None)` means the
/// provider has nothing useful to say (unsupported sport or prop, or
/// too few recent games) — it is not an error.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Recent-form summary for one player prop.
    async fn fetch_form(
        &self,
        sport: Sport,
        player: &str,
        prop: &PropCategory,
        line: f64,
        side: Side,
    ) -> Result<Option<PlayerForm>>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}

/// Screen a ranked pick list against recent form.
///
/// Picks with hot form are kept and annotated; picks with cold form are
/// dropped; picks the provider cannot assess pass through unscreened —
/// the consensus signal stands on its own. A provider failure also
/// passes the pick through: stats are a cross-check, never a gate on
/// availability.
pub async fn screen_picks(
    provider: &dyn StatsProvider,
    sport: Sport,
    picks: Vec<ConsensusPick>,
) -> Vec<ConsensusPick> {
    let mut kept = Vec::new();

    for mut pick in picks {
        match provider
            .fetch_form(sport, &pick.player, &pick.prop, pick.line, pick.side)
            .await
        {
            Ok(Some(form)) if form.is_hot() => {
                info!(player = %pick.player, prop = %pick.prop, form = %form, "Form confirms pick");
                pick.form = Some(form);
                kept.push(pick);
            }
            Ok(Some(form)) => {
                debug!(player = %pick.player, prop = %pick.prop, form = %form, "Cold form, pick dropped");
            }
            Ok(None) => {
                kept.push(pick);
            }
            Err(e) => {
                warn!(player = %pick.player, error = %e, "Form lookup failed, keeping pick");
                kept.push(pick);
            }
        }
    }

    kept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Canned-response provider for screen tests.
    struct FixedForm {
        responses: Mutex<Vec<Result<Option<PlayerForm>>>>,
    }

    impl FixedForm {
        fn new(responses: Vec<Result<Option<PlayerForm>>>) -> Self {
            Self { responses: Mutex::new(responses) }
        }
    }

    #[async_trait]
    impl StatsProvider for FixedForm {
        async fn fetch_form(
            &self,
            _sport: Sport,
            _player: &str,
            _prop: &PropCategory,
            _line: f64,
            _side: Side,
        ) -> Result<Option<PlayerForm>> {
            self.responses.lock().unwrap().remove(0)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn pick(player: &str) -> ConsensusPick {
        let mut p = ConsensusPick::sample();
        p.player = player.to_string();
        p
    }

    fn form(hit_rate: f64) -> PlayerForm {
        PlayerForm { hit_rate, average: 25.0, games: 10 }
    }

    #[tokio::test]
    async fn test_screen_keeps_hot_and_annotates() {
        let provider = FixedForm::new(vec![Ok(Some(form(72.0)))]);
        let kept = screen_picks(&provider, Sport::Nba, vec![pick("hot")]).await;
        assert_eq!(kept.len(), 1);
        let f = kept[0].form.unwrap();
        assert!((f.hit_rate - 72.0).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_screen_drops_cold() {
        let provider = FixedForm::new(vec![Ok(Some(form(40.0)))]);
        let kept = screen_picks(&provider, Sport::Nba, vec![pick("cold")]).await;
        assert!(kept.is_empty());
    }

    #[tokio::test]
    async fn test_screen_passes_through_uncovered() {
        let provider = FixedForm::new(vec![Ok(None)]);
        let kept = screen_picks(&provider, Sport::Nba, vec![pick("unknown")]).await;
        assert_eq!(kept.len(), 1);
        assert!(kept[0].form.is_none());
    }

    #[tokio::test]
    async fn test_screen_tolerates_provider_failure() {
        let provider = FixedForm::new(vec![Err(anyhow::anyhow!("stats API down"))]);
        let kept = screen_picks(&provider, Sport::Nba, vec![pick("survivor")]).await;
        assert_eq!(kept.len(), 1);
    }

    #[tokio::test]
    async fn test_screen_preserves_order_of_kept_picks() {
        let provider = FixedForm::new(vec![
            Ok(Some(form(80.0))),
            Ok(Some(form(30.0))),
            Ok(None),
        ]);
        let picks = vec![pick("a"), pick("b"), pick("c")];
        let kept = screen_picks(&provider, Sport::Nba, picks).await;
        let names: Vec<_> = kept.iter().map(|p| p.player.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
