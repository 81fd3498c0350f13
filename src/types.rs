use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{BYE_ID_PREFIX, DEFAULT_COURSE_PAR, HOLES};
use crate::error::{AppError, Result};

/// One player's gross strokes per hole as submitted for a match.
/// `None` marks a hole left blank; it scores as 0 gross.
pub type HoleCard = Vec<Option<i32>>;

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// One player's completed 9-hole outing. Appended to history, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub player_id: String,
    /// Nanosecond UTC epoch of submission.
    pub date_ns: i64,
    pub course_par: Option<i32>,
    pub hole_scores: Vec<i32>,
    pub gross_score: i32,
    pub differential: Option<i32>,
}

impl Round {
    /// Build a round from a submitted card. Gross and differential are derived
    /// here so they always agree with `hole_scores`.
    pub fn new(
        player_id: impl Into<String>,
        course_par: Option<i32>,
        hole_scores: Vec<i32>,
        date_ns: i64,
    ) -> Result<Self> {
        if hole_scores.len() != HOLES {
            return Err(AppError::Validation(format!(
                "expected {HOLES} hole scores, got {}",
                hole_scores.len()
            )));
        }
        if let Some((idx, score)) = hole_scores.iter().enumerate().find(|(_, s)| **s < 0) {
            return Err(AppError::Validation(format!(
                "hole {} has negative score {score}",
                idx + 1
            )));
        }
        let par = course_par.unwrap_or(DEFAULT_COURSE_PAR);
        if par <= 0 {
            return Err(AppError::Validation(format!("course par must be positive, got {par}")));
        }

        let gross_score = hole_scores
            .iter()
            .try_fold(0i32, |total, score| total.checked_add(*score))
            .ok_or_else(|| AppError::Validation("hole scores overflow the gross total".to_string()))?;
        Ok(Self {
            player_id: player_id.into(),
            date_ns,
            course_par: Some(par),
            hole_scores,
            gross_score,
            differential: Some(crate::handicap::differential_from_round(gross_score, par)),
        })
    }

    /// Stored differential, or `gross - par` (par defaulting to 36) for records
    /// that were saved without one.
    pub fn resolved_differential(&self) -> i32 {
        self.differential.unwrap_or_else(|| {
            crate::handicap::differential_from_round(
                self.gross_score,
                self.course_par.unwrap_or(DEFAULT_COURSE_PAR),
            )
        })
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team_id: String,
    /// Cached handicap; may lag behind a fresh computation from rounds.
    pub current_handicap9: Option<f64>,
}

impl Player {
    /// Placeholder filling an empty roster slot. Always a no-show.
    pub fn bye(slot: usize) -> Self {
        Self {
            id: format!("{BYE_ID_PREFIX}{slot}"),
            name: "BYE".to_string(),
            team_id: String::new(),
            current_handicap9: None,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.id.starts_with(BYE_ID_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// Cumulative match points over the season.
    pub season_points: f64,
    /// Designated match players, at most two.
    pub player_ids: Vec<String>,
}

/// A team as fielded for one match: its id plus the players who may play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLineup {
    pub id: String,
    pub players: Vec<Player>,
}

// ---------------------------------------------------------------------------
// Match result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

/// One player's share of a pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPairResult {
    pub id: String,
    /// Net strokes per hole. Empty when either player in the pairing no-showed.
    pub hole_net: Vec<i64>,
    pub hole_points: f64,
    pub total_net: i64,
    /// Hole points plus the aggregate point, or the flat forfeit award.
    pub points: f64,
    pub no_show: bool,
}

impl PlayerPairResult {
    pub(crate) fn unscored(id: &str, points: f64, no_show: bool) -> Self {
        Self {
            id: id.to_string(),
            hole_net: Vec::new(),
            hole_points: 0.0,
            total_net: 0,
            points,
            no_show,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    pub player_a_id: String,
    pub player_b_id: String,
    pub player_a: PlayerPairResult,
    pub player_b: PlayerPairResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub team_a_id: String,
    pub team_b_id: String,
    pub date_ns: i64,
    /// Pair 1 (lowest handicaps) then Pair 2.
    pub pairs: Vec<PairResult>,
    pub team_a_score: f64,
    pub team_b_score: f64,
}

// ---------------------------------------------------------------------------
// Events - sent over mpsc to the DB writer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum LeagueEvent {
    MatchRecorded(MatchResult),
    HandicapRefreshed { player_id: String, handicap9: f64 },
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Round to one decimal place, halves away from zero (`0.25 -> 0.3`, `-0.25 -> -0.3`).
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}
