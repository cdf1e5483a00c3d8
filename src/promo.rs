//! Promotional copy generation.
//!
//! Canned hype and status lines for the chat layer. Phrasing is picked
//! at random per message so the channel doesn't read like a template,
//! but every variant carries the same pick facts.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{format_american, ConsensusPick, Sport};

pub const TAGLINE: &str = "Real lines. Real consensus. Real picks.";

/// Shown when a sport has games but nothing cleared the consensus bar.
/// Deliberately distinct from [`SERVICE_UNAVAILABLE`]: this one means
/// "wait", that one means "the provider is broken".
pub const NO_PICKS: &str = "No consensus picks right now. Check back closer to game time.";

/// Shown when the odds provider itself is failing or rejecting us.
pub const SERVICE_UNAVAILABLE: &str =
    "Odds service unavailable right now. Lines will be back shortly.";

const HYPE_OPENERS: &[&str] = &[
    "Tonight's headliner:",
    "The books agree on this one:",
    "Pick of the day:",
    "Consensus says:",
];

const HYPE_CLOSERS: &[&str] = &[
    "Get it while the line holds.",
    "The board doesn't lie.",
    "That's the play.",
];

/// One-line hype message for a pick, with randomized phrasing.
pub fn hype_message(pick: &ConsensusPick) -> String {
    hype_message_with(pick, &mut rand::thread_rng())
}

/// Deterministic variant for tests — phrasing comes from the caller's RNG.
pub fn hype_message_with<R: Rng + ?Sized>(pick: &ConsensusPick, rng: &mut R) -> String {
    let opener = HYPE_OPENERS.choose(rng).copied().unwrap_or(HYPE_OPENERS[0]);
    let closer = HYPE_CLOSERS.choose(rng).copied().unwrap_or(HYPE_CLOSERS[0]);

    let mut line = format!(
        "{opener} {} {} {} {} at {} across {} books.",
        pick.player,
        pick.side,
        pick.line,
        pick.prop,
        format_american(pick.avg_odds),
        pick.source_count,
    );

    if let Some(form) = &pick.form {
        line.push_str(&format!(" {form}."));
    }

    line.push(' ');
    line.push_str(closer);
    line
}

/// One-line board summary for a sport.
pub fn board_summary(sport: Sport, picks: &[ConsensusPick]) -> String {
    if picks.is_empty() {
        return format!("{sport}: {NO_PICKS}");
    }
    format!(
        "{sport}: {} consensus picks on the board. {TAGLINE}",
        picks.len(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
