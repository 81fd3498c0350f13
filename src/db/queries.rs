use sqlx::SqlitePool;

use crate::db::models::{MatchRow, PlayerRow, RoundRow, TeamRow};
use crate::error::Result;
use crate::types::{MatchResult, Player, Round, Team};

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

pub async fn load_players(pool: &SqlitePool) -> Result<Vec<Player>> {
    let rows = sqlx::query_as::<_, PlayerRow>(
        "SELECT id, name, team_id, current_handicap9 FROM players ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Player::from).collect())
}

pub async fn load_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let rows = sqlx::query_as::<_, TeamRow>(
        "SELECT id, name, season_points, player1_id, player2_id FROM teams ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Team::from).collect())
}

pub async fn insert_team(pool: &SqlitePool, team: &Team) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO teams (id, name, season_points, player1_id, player2_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&team.id)
    .bind(&team.name)
    .bind(team.season_points)
    .bind(team.player_ids.first().cloned())
    .bind(team.player_ids.get(1).cloned())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_player(pool: &SqlitePool, player: &Player) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO players (id, name, team_id, current_handicap9)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&player.id)
    .bind(&player.name)
    .bind(&player.team_id)
    .bind(player.current_handicap9)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_player_handicap(pool: &SqlitePool, player_id: &str, handicap9: f64) -> Result<()> {
    sqlx::query("UPDATE players SET current_handicap9 = ? WHERE id = ?")
        .bind(handicap9)
        .bind(player_id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

pub async fn insert_round(pool: &SqlitePool, round: &Round) -> Result<()> {
    let hole_scores = serde_json::to_string(&round.hole_scores)?;
    sqlx::query(
        r#"
        INSERT INTO rounds (player_id, date, course_par, hole_scores, gross_score, differential)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&round.player_id)
    .bind(round.date_ns)
    .bind(round.course_par)
    .bind(hole_scores)
    .bind(round.gross_score)
    .bind(round.differential)
    .execute(pool)
    .await?;
    Ok(())
}

/// A player's rounds, newest first. This is the ordering the handicap calculation expects.
pub async fn player_rounds(pool: &SqlitePool, player_id: &str, limit: i64) -> Result<Vec<Round>> {
    let rows = sqlx::query_as::<_, RoundRow>(
        r#"
        SELECT player_id, date, course_par, hole_scores, gross_score, differential
        FROM rounds
        WHERE player_id = ?
        ORDER BY date DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(player_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(RoundRow::into_round).collect()
}

pub async fn recent_rounds(pool: &SqlitePool, limit: i64) -> Result<Vec<Round>> {
    let rows = sqlx::query_as::<_, RoundRow>(
        r#"
        SELECT player_id, date, course_par, hole_scores, gross_score, differential
        FROM rounds
        ORDER BY date DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(RoundRow::into_round).collect()
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// Store a match and credit both teams' season points in one transaction.
pub async fn record_match(pool: &SqlitePool, result: &MatchResult) -> Result<()> {
    let pairs = serde_json::to_string(&result.pairs)?;
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO matches (team_a_id, team_b_id, date, team_a_score, team_b_score, pairs)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&result.team_a_id)
    .bind(&result.team_b_id)
    .bind(result.date_ns)
    .bind(result.team_a_score)
    .bind(result.team_b_score)
    .bind(pairs)
    .execute(&mut *tx)
    .await?;

    for (team_id, points) in [
        (&result.team_a_id, result.team_a_score),
        (&result.team_b_id, result.team_b_score),
    ] {
        sqlx::query("UPDATE teams SET season_points = season_points + ? WHERE id = ?")
            .bind(points)
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn recent_matches(pool: &SqlitePool, limit: i64) -> Result<Vec<MatchResult>> {
    let rows = sqlx::query_as::<_, MatchRow>(
        r#"
        SELECT team_a_id, team_b_id, date, team_a_score, team_b_score, pairs
        FROM matches
        ORDER BY date DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(MatchRow::into_match).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
