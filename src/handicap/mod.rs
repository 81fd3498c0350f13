pub mod engine;

pub use engine::{compute_handicap9, differential_from_round};
