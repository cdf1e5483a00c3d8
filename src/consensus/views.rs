//! Derived views over a consensus pick list.
//!
//! Pure filter/selection predicates applied by callers — the pick
//! list itself is already ranked by [`super::aggregate`].

use crate::types::{ConsensusPick, LocksmithError};

use super::aggregate::implied_probability;

/// Default source count for a pick to qualify as a "lock".
pub const LOCK_MIN_SOURCES: usize = 3;

/// Default edge (percentage points) for a pick to qualify as a value bet.
pub const VALUE_MIN_EDGE: f64 = 5.0;

/// Picks backed by at least `min_sources` agreeing books.
pub fn filter_locks(picks: &[ConsensusPick], min_sources: usize) -> Vec<ConsensusPick> {
    picks
        .iter()
        .filter(|p| p.source_count >= min_sources)
        .cloned()
        .collect()
}

/// The edge of a pick: its consensus probability minus the probability
/// implied by its own averaged odds. A positive edge means the blended
/// book price undervalues the consensus estimate.
pub fn edge(pick: &ConsensusPick) -> Result<f64, LocksmithError> {
    Ok(pick.avg_probability - implied_probability(pick.avg_odds)?)
}

/// Picks whose edge exceeds `min_edge`, paired with the edge itself.
pub fn filter_value(
    picks: &[ConsensusPick],
    min_edge: f64,
) -> Result<Vec<(ConsensusPick, f64)>, LocksmithError> {
    let mut value = Vec::new();
    for pick in picks {
        let e = edge(pick)?;
        if e > min_edge {
            value.push((pick.clone(), e));
        }
    }
    Ok(value)
}

/// The single best pick across any number of (possibly multi-sport)
/// pick lists, under the same (source count, probability) order the
/// aggregation sort uses. Exact ties resolve to the earliest pick in
/// the input, so repeated calls with the same input agree.
pub fn top_pick(picks: &[ConsensusPick]) -> Option<&ConsensusPick> {
    let mut best: Option<&ConsensusPick> = None;
    for pick in picks {
        let beats = match best {
            None => true,
            Some(b) => {
                pick.source_count > b.source_count
                    || (pick.source_count == b.source_count
                        && pick.avg_probability > b.avg_probability)
            }
        };
        if beats {
            best = Some(pick);
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
