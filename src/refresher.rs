use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::api::health::HealthState;
use crate::config::{HANDICAP_REFRESH_INTERVAL_SECS, HANDICAP_WINDOW};
use crate::db::queries::player_rounds;
use crate::error::{AppError, Result};
use crate::handicap::compute_handicap9;
use crate::state::RosterStore;
use crate::types::{now_ns, LeagueEvent, Player};

/// Background task that recomputes every player's cached handicap from their rounds.
/// Changed values go to the roster immediately and to the DB via the writer.
pub struct HandicapRefresher {
    pool: sqlx::SqlitePool,
    roster: Arc<RosterStore>,
    event_tx: mpsc::Sender<LeagueEvent>,
    health: Arc<HealthState>,
}

impl HandicapRefresher {
    pub fn new(
        pool: sqlx::SqlitePool,
        roster: Arc<RosterStore>,
        event_tx: mpsc::Sender<LeagueEvent>,
        health: Arc<HealthState>,
    ) -> Self {
        Self { pool, roster, event_tx, health }
    }

    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(HANDICAP_REFRESH_INTERVAL_SECS));

        loop {
            ticker.tick().await;
            match self.refresh_all().await {
                Ok(changed) => info!("Handicap refresh complete: {changed} players changed"),
                Err(e) => error!("Handicap refresh failed: {e}"),
            }
        }
    }

    /// Returns how many cached handicaps changed.
    pub async fn refresh_all(&self) -> Result<usize> {
        let mut changed = 0;
        for player in self.roster.players() {
            if self.refresh_player(&player).await? {
                changed += 1;
            }
        }
        self.health.set_last_refresh_at_ns(now_ns() as u64);
        Ok(changed)
    }

    /// Recompute one player's handicap from `snapshot`'s point of view. The roster
    /// is only updated if it still holds the snapshot's value, so a handicap set by
    /// a round submitted mid-refresh is never overwritten with an older one.
    async fn refresh_player(&self, snapshot: &Player) -> Result<bool> {
        let rounds = player_rounds(&self.pool, &snapshot.id, HANDICAP_WINDOW as i64).await?;
        let handicap9 = compute_handicap9(&rounds);
        if snapshot.current_handicap9 == Some(handicap9)
            || !self
                .roster
                .replace_handicap(&snapshot.id, snapshot.current_handicap9, handicap9)
        {
            return Ok(false);
        }

        self.health.inc_write_queue_pending();
        if let Err(e) = self
            .event_tx
            .send(LeagueEvent::HandicapRefreshed { player_id: snapshot.id.clone(), handicap9 })
            .await
        {
            self.health.dec_write_queue_pending();
            warn!("Failed to queue handicap for {}: {e}", snapshot.id);
            return Err(AppError::ChannelSend(e.to_string()));
        }
        Ok(true)
    }
}
