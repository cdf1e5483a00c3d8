//! Offer grouping and consensus derivation.
//!
//! Groups raw offers by (player, prop, side), drops groups without at
//! least two agreeing books, and averages the remainder into
//! `ConsensusPick`s sorted by (source count, average probability).

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::types::{ConsensusPick, LocksmithError, PropCategory, RawOffer, Side};

/// Minimum distinct offers required for a group to count as consensus.
/// A single book quoting a line establishes nothing.
pub const MIN_CONSENSUS_SOURCES: usize = 2;

// ---------------------------------------------------------------------------
// Odds → probability transform
// ---------------------------------------------------------------------------

/// Implied win probability of an American odds quote, as a percentage.
///
/// Positive (underdog) odds land strictly below 50, negative (favorite)
/// odds strictly above, and ±100 both map to exactly 50. Zero is
/// undefined in American notation and is rejected rather than mapped to
/// a nonsense value.
pub fn implied_probability(odds: i32) -> Result<f64, LocksmithError> {
    match odds.cmp(&0) {
        Ordering::Greater => Ok(100.0 / (odds as f64 + 100.0) * 100.0),
        Ordering::Less => {
            let abs = odds.unsigned_abs() as f64;
            Ok(abs / (abs + 100.0) * 100.0)
        }
        Ordering::Equal => Err(LocksmithError::InvalidOdds(0)),
    }
}

// ---------------------------------------------------------------------------
// Player name normalization
// ---------------------------------------------------------------------------

/// Normalize a player name for grouping: trim and case-fold.
///
/// Upstream player names are free text, and books disagree on casing
/// and stray whitespace. Normalization is an explicit step so the
/// grouping key never depends on provider formatting quirks; the
/// first-seen spelling is still what gets displayed.
pub fn normalize_player(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Grouping key for one consensus candidate. The line is deliberately
/// NOT part of the key — books quoting the same player/prop/side at
/// slightly different lines still agree on the pick.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    player: String,
    prop: PropCategory,
    side: Side,
}

/// Reduce a flat offer sequence to ranked consensus picks.
///
/// Groups with fewer than [`MIN_CONSENSUS_SOURCES`] members are dropped
/// silently. An empty input yields an empty output. The only error is a
/// malformed offer carrying zero odds, which violates the `RawOffer`
/// invariant.
pub fn aggregate(offers: &[RawOffer]) -> Result<Vec<ConsensusPick>, LocksmithError> {
    // Group in encounter order so equal-rank picks keep a stable order.
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, Vec<&RawOffer>> = HashMap::new();

    for offer in offers {
        let key = GroupKey {
            player: normalize_player(&offer.player),
            prop: offer.prop.clone(),
            side: offer.side,
        };
        match groups.entry(key) {
            Entry::Occupied(mut e) => e.get_mut().push(offer),
            Entry::Vacant(e) => {
                order.push(e.key().clone());
                e.insert(vec![offer]);
            }
        }
    }

    let mut picks = Vec::new();

    for key in &order {
        let members = &groups[key];
        if members.len() < MIN_CONSENSUS_SOURCES {
            continue;
        }

        let count = members.len();

        let mut prob_sum = 0.0;
        for offer in members {
            prob_sum += implied_probability(offer.odds)?;
        }
        let avg_probability = prob_sum / count as f64;

        // Averaged over the raw quotes, not re-derived from the averaged
        // probability — the two deliberately disagree in general.
        let odds_sum: i64 = members.iter().map(|o| o.odds as i64).sum();
        let avg_odds = (odds_sum as f64 / count as f64).round() as i32;

        let first = members[0];

        let mut line_min = first.line;
        let mut line_max = first.line;
        for offer in &members[1..] {
            line_min = line_min.min(offer.line);
            line_max = line_max.max(offer.line);
        }
        let line_range = if line_max > line_min {
            Some((line_min, line_max))
        } else {
            None
        };

        picks.push(ConsensusPick {
            player: first.player.clone(),
            prop: first.prop.clone(),
            line: first.line,
            side: first.side,
            source_count: count,
            avg_probability,
            avg_odds,
            game: first.game.clone(),
            bookmakers: members.iter().map(|o| o.bookmaker.clone()).collect(),
            line_range,
            form: None,
        });
    }

    rank(&mut picks);
    Ok(picks)
}

/// Sort picks descending by (source count, average probability).
///
/// Source count dominates: three agreeing books always outrank two,
/// whatever the probabilities. The sort is stable, so exact ties keep
/// their existing order.
pub fn rank(picks: &mut [ConsensusPick]) {
    picks.sort_by(|a, b| {
        b.source_count
            .cmp(&a.source_count)
            .then_with(|| {
                b.avg_probability
                    .partial_cmp(&a.avg_probability)
                    .unwrap_or(Ordering::Equal)
            })
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
