pub mod match_scorer;
pub mod strokes;

pub use match_scorer::{compute_match_result, handicaps_from_players};
