use crate::config::HOLES;

/// Spread a handicap across the nine holes.
///
/// The handicap is rounded to whole strokes (negative or non-finite values give
/// none). Every hole gets `strokes / 9`; the remainder goes one apiece to the
/// lowest-numbered holes. There is no per-course stroke index, so low hole
/// numbers stand in for the hardest holes.
pub fn distribute_strokes(handicap: f64) -> [i32; HOLES] {
    let strokes = if handicap.is_finite() { handicap.round().max(0.0) as i32 } else { 0 };
    let base = strokes / HOLES as i32;
    let remainder = (strokes % HOLES as i32) as usize;

    std::array::from_fn(|hole| if hole < remainder { base + 1 } else { base })
}

/// Gross minus allocated strokes, hole by hole. Blank or missing holes count as 0 gross.
/// Widened to i64 so any submitted card value nets without overflow.
pub fn net_hole_scores(gross: &[Option<i32>], handicap: f64) -> [i64; HOLES] {
    let strokes = distribute_strokes(handicap);
    std::array::from_fn(|hole| {
        let gross = gross.get(hole).copied().flatten().unwrap_or(0);
        i64::from(gross) - i64::from(strokes[hole])
    })
}
