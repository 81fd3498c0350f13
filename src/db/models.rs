//! Database row types matching migrations/0001_init.sql.
//! Hole scores and match pairs are stored as JSON text.
use crate::error::Result;
use crate::types::{MatchResult, PairResult, Player, Round, Team};

#[derive(Debug, sqlx::FromRow)]
pub struct TeamRow {
    pub id: String,
    pub name: String,
    pub season_points: f64,
    pub player1_id: Option<String>,
    pub player2_id: Option<String>,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            id: row.id,
            name: row.name,
            season_points: row.season_points,
            player_ids: [row.player1_id, row.player2_id].into_iter().flatten().collect(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PlayerRow {
    pub id: String,
    pub name: String,
    pub team_id: String,
    pub current_handicap9: Option<f64>,
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Player {
            id: row.id,
            name: row.name,
            team_id: row.team_id,
            current_handicap9: row.current_handicap9,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct RoundRow {
    pub player_id: String,
    pub date: i64,
    pub course_par: Option<i64>,
    pub hole_scores: String,
    pub gross_score: i64,
    pub differential: Option<i64>,
}

impl RoundRow {
    pub fn into_round(self) -> Result<Round> {
        Ok(Round {
            player_id: self.player_id,
            date_ns: self.date,
            course_par: self.course_par.map(|p| p as i32),
            hole_scores: serde_json::from_str(&self.hole_scores)?,
            gross_score: self.gross_score as i32,
            differential: self.differential.map(|d| d as i32),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct MatchRow {
    pub team_a_id: String,
    pub team_b_id: String,
    pub date: i64,
    pub team_a_score: f64,
    pub team_b_score: f64,
    pub pairs: String,
}

impl MatchRow {
    pub fn into_match(self) -> Result<MatchResult> {
        let pairs: Vec<PairResult> = serde_json::from_str(&self.pairs)?;
        Ok(MatchResult {
            team_a_id: self.team_a_id,
            team_b_id: self.team_b_id,
            date_ns: self.date,
            pairs,
            team_a_score: self.team_a_score,
            team_b_score: self.team_b_score,
        })
    }
}
