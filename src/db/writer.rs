use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::api::health::HealthState;
use crate::db::queries::{record_match, update_player_handicap};
use crate::error::Result;
use crate::state::RosterStore;
use crate::types::LeagueEvent;

/// Receives LeagueEvents from the API and the refresher and persists them to SQLite.
/// Runs as a dedicated background task so request handlers never wait on match writes.
/// Season points reach the roster only after the match has been committed.
pub struct DbWriter {
    pool: sqlx::SqlitePool,
    event_rx: mpsc::Receiver<LeagueEvent>,
    health: Arc<HealthState>,
    roster: Arc<RosterStore>,
}

impl DbWriter {
    pub fn new(
        pool: sqlx::SqlitePool,
        event_rx: mpsc::Receiver<LeagueEvent>,
        health: Arc<HealthState>,
        roster: Arc<RosterStore>,
    ) -> Self {
        Self { pool, event_rx, health, roster }
    }

    pub async fn run(mut self) {
        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.write_event(&event).await {
                error!("DB write error: {e}");
            }
            self.health.dec_write_queue_pending();
        }
    }

    pub(crate) async fn write_event(&self, event: &LeagueEvent) -> Result<()> {
        match event {
            LeagueEvent::MatchRecorded(result) => {
                record_match(&self.pool, result).await?;
                self.roster.credit_season_points(&result.team_a_id, result.team_a_score);
                self.roster.credit_season_points(&result.team_b_id, result.team_b_score);
                self.health.inc_matches_recorded();
                info!(
                    event = "MATCH_RECORDED",
                    team_a = %result.team_a_id,
                    team_b = %result.team_b_id,
                    "MATCH SAVED | {} {:.1} - {:.1} {}",
                    result.team_a_id, result.team_a_score, result.team_b_score, result.team_b_id,
                );
            }
            LeagueEvent::HandicapRefreshed { player_id, handicap9 } => {
                // The roster may have moved on since this event was queued; persist its latest value.
                let latest = self
                    .roster
                    .get_player(player_id)
                    .and_then(|p| p.current_handicap9)
                    .unwrap_or(*handicap9);
                update_player_handicap(&self.pool, player_id, latest).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::{insert_player, insert_team, load_players, load_teams, tests::test_pool};
    use crate::types::{MatchResult, Player, Team};

    fn pat() -> Player {
        Player { id: "p1".into(), name: "Pat".into(), team_id: "t1".into(), current_handicap9: None }
    }

    async fn league_with_two_teams(pool: &sqlx::SqlitePool) -> Arc<RosterStore> {
        let roster = RosterStore::new();
        for id in ["t1", "t2"] {
            let team = Team { id: id.into(), name: id.to_uppercase(), season_points: 0.0, player_ids: vec![] };
            insert_team(pool, &team).await.unwrap();
            roster.add_team(team);
        }
        roster
    }

    fn t1_beats_t2() -> MatchResult {
        MatchResult {
            team_a_id: "t1".into(),
            team_b_id: "t2".into(),
            date_ns: 1,
            pairs: vec![],
            team_a_score: 12.5,
            team_b_score: 7.5,
        }
    }

    #[tokio::test]
    async fn writer_drains_events_and_updates_health() {
        let pool = test_pool().await;
        insert_player(&pool, &pat()).await.unwrap();

        let health = Arc::new(HealthState::new());
        let (tx, rx) = mpsc::channel(4);
        let writer = DbWriter::new(pool.clone(), rx, Arc::clone(&health), RosterStore::new());

        health.inc_write_queue_pending();
        tx.send(LeagueEvent::HandicapRefreshed { player_id: "p1".into(), handicap9: 2.6 })
            .await
            .unwrap();
        drop(tx);
        writer.run().await;

        assert_eq!(health.write_queue_pending(), 0);
        let players = load_players(&pool).await.unwrap();
        assert_eq!(players[0].current_handicap9, Some(2.6));
    }

    #[tokio::test]
    async fn handicap_write_persists_the_latest_roster_value() {
        let pool = test_pool().await;
        insert_player(&pool, &pat()).await.unwrap();
        let roster = RosterStore::new();
        roster.add_player(Player { current_handicap9: Some(4.0), ..pat() });

        let (_tx, rx) = mpsc::channel(1);
        let writer = DbWriter::new(pool.clone(), rx, Arc::new(HealthState::new()), roster);
        // queued with a value that has since been superseded
        writer
            .write_event(&LeagueEvent::HandicapRefreshed { player_id: "p1".into(), handicap9: 1.0 })
            .await
            .unwrap();

        assert_eq!(load_players(&pool).await.unwrap()[0].current_handicap9, Some(4.0));
    }

    #[tokio::test]
    async fn committed_match_credits_the_roster() {
        let pool = test_pool().await;
        let roster = league_with_two_teams(&pool).await;
        let health = Arc::new(HealthState::new());
        let (tx, rx) = mpsc::channel(4);
        let writer = DbWriter::new(pool.clone(), rx, Arc::clone(&health), Arc::clone(&roster));

        health.inc_write_queue_pending();
        tx.send(LeagueEvent::MatchRecorded(t1_beats_t2())).await.unwrap();
        drop(tx);
        writer.run().await;

        assert_eq!(roster.get_team("t1").unwrap().season_points, 12.5);
        assert_eq!(roster.get_team("t2").unwrap().season_points, 7.5);
        assert_eq!(load_teams(&pool).await.unwrap()[0].season_points, 12.5);
        assert_eq!(health.matches_recorded(), 1);
    }

    #[tokio::test]
    async fn failed_match_write_leaves_the_roster_untouched() {
        let pool = test_pool().await;
        let roster = league_with_two_teams(&pool).await;
        sqlx::query("DROP TABLE matches").execute(&pool).await.unwrap();

        let health = Arc::new(HealthState::new());
        let (tx, rx) = mpsc::channel(4);
        let writer = DbWriter::new(pool.clone(), rx, Arc::clone(&health), Arc::clone(&roster));

        health.inc_write_queue_pending();
        tx.send(LeagueEvent::MatchRecorded(t1_beats_t2())).await.unwrap();
        drop(tx);
        writer.run().await;

        assert_eq!(roster.get_team("t1").unwrap().season_points, 0.0);
        assert_eq!(load_teams(&pool).await.unwrap()[0].season_points, 0.0);
        assert_eq!(health.matches_recorded(), 0);
        assert_eq!(health.write_queue_pending(), 0);
    }
}
