//! Parlay odds arithmetic.
//!
//! Multiplies 2-6 legs of American odds through decimal space and
//! converts the product back, matching how books quote combined bets.

use crate::types::LocksmithError;

/// Fewest legs a parlay may carry.
pub const MIN_PARLAY_LEGS: usize = 2;
/// Most legs a parlay may carry.
pub const MAX_PARLAY_LEGS: usize = 6;

/// Convert American odds to decimal odds.
pub fn american_to_decimal(odds: i32) -> Result<f64, LocksmithError> {
    if odds > 0 {
        Ok(odds as f64 / 100.0 + 1.0)
    } else if odds < 0 {
        Ok(100.0 / odds.unsigned_abs() as f64 + 1.0)
    } else {
        Err(LocksmithError::InvalidOdds(0))
    }
}

/// Combined American odds for a parlay of the given legs.
///
/// Legs multiply in decimal space; the product converts back to
/// American notation (positive when the combined price is at least
/// even money, truncated toward zero as books quote them).
pub fn parlay_odds(legs: &[i32]) -> Result<i32, LocksmithError> {
    if legs.len() < MIN_PARLAY_LEGS || legs.len() > MAX_PARLAY_LEGS {
        return Err(LocksmithError::ParlayLegs(legs.len()));
    }

    let mut total = 1.0;
    for odds in legs {
        total *= american_to_decimal(*odds)?;
    }

    if total >= 2.0 {
        Ok(((total - 1.0) * 100.0) as i32)
    } else {
        Ok((-100.0 / (total - 1.0)) as i32)
    }
}

/// Total return (stake included) on a winning bet at the given
/// American odds.
pub fn parlay_payout(odds: i32, stake: f64) -> f64 {
    if odds > 0 {
        stake + stake * odds as f64 / 100.0
    } else {
        stake + stake * 100.0 / odds.unsigned_abs() as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_american_to_decimal() {
        assert!((american_to_decimal(100).unwrap() - 2.0).abs() < 1e-10);
        assert!((american_to_decimal(-100).unwrap() - 2.0).abs() < 1e-10);
        assert!((american_to_decimal(150).unwrap() - 2.5).abs() < 1e-10);
        assert!((american_to_decimal(-200).unwrap() - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_american_to_decimal_zero_rejected() {
        assert!(american_to_decimal(0).is_err());
    }

    #[test]
    fn test_parlay_three_standard_legs() {
        // Three legs at -110: 1.9090..³ ≈ 6.958 decimal → +595.
        let odds = parlay_odds(&[-110, -110, -110]).unwrap();
        assert_eq!(odds, 595);

        let payout = parlay_payout(odds, 100.0);
        assert!((payout - 695.0).abs() < 1e-10);
    }

    #[test]
    fn test_parlay_two_heavy_favorites() {
        // Two legs at -200: 1.5 × 1.5 = 2.25 decimal → +125.
        assert_eq!(parlay_odds(&[-200, -200]).unwrap(), 125);
    }

    #[test]
    fn test_parlay_stays_negative_below_even_money() {
        // Two legs at -500: 1.2 × 1.2 = 1.44 decimal → -227.
        let odds = parlay_odds(&[-500, -500]).unwrap();
        assert_eq!(odds, -227);

        let payout = parlay_payout(odds, 100.0);
        assert!((payout - 144.05).abs() < 0.01);
    }

    #[test]
    fn test_parlay_leg_count_bounds() {
        assert!(matches!(
            parlay_odds(&[-110]),
            Err(LocksmithError::ParlayLegs(1))
        ));
        assert!(matches!(
            parlay_odds(&[-110; 7]),
            Err(LocksmithError::ParlayLegs(7))
        ));
        assert!(parlay_odds(&[-110; 6]).is_ok());
    }

    #[test]
    fn test_parlay_zero_leg_rejected() {
        assert!(matches!(
            parlay_odds(&[-110, 0]),
            Err(LocksmithError::InvalidOdds(0))
        ));
    }
}
