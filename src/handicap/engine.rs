//! 9-hole handicap index from a player's round history.
//!
//! The league uses a simple differential (gross minus par) rather than a
//! slope/rating adjusted one. A player's index is the mean of their best
//! differentials among their most recent rounds, with short histories padded
//! by "played to par" entries.

use crate::config::{HANDICAP_BEST_OF, HANDICAP_WINDOW};
use crate::types::{round_to_tenth, Round};

pub fn differential_from_round(gross: i32, par: i32) -> i32 {
    gross.saturating_sub(par)
}

/// Current handicap index for one player.
///
/// `rounds` must already be ordered newest first. Ordering is the caller's
/// responsibility and is not checked.
pub fn compute_handicap9(rounds: &[Round]) -> f64 {
    let differentials: Vec<i32> = rounds
        .iter()
        .take(HANDICAP_WINDOW)
        .map(Round::resolved_differential)
        .collect();
    compute_handicap9_from_differentials(&differentials)
}

/// Same calculation over raw differentials, newest first.
pub fn compute_handicap9_from_differentials(differentials: &[i32]) -> f64 {
    let mut recent: Vec<i32> = differentials.iter().take(HANDICAP_WINDOW).copied().collect();
    if recent.len() < HANDICAP_BEST_OF {
        recent.resize(HANDICAP_BEST_OF, 0);
    }
    recent.sort_unstable();

    let best_sum: i64 = recent.iter().take(HANDICAP_BEST_OF).map(|d| i64::from(*d)).sum();
    round_to_tenth(best_sum as f64 / HANDICAP_BEST_OF as f64)
}
