use sqlx::SqlitePool;
use tracing::info;

use crate::config::DEMO_TEAM_COUNT;
use crate::db::queries::{insert_player, insert_team, load_teams};
use crate::error::Result;
use crate::types::{Player, Team};

/// Fill an empty database with a demo league: `DEMO_TEAM_COUNT` teams of two players.
/// Returns the number of teams created (0 when the league already has teams).
pub async fn seed_demo_league(pool: &SqlitePool) -> Result<usize> {
    if !load_teams(pool).await?.is_empty() {
        return Ok(0);
    }

    for (team, players) in demo_league() {
        insert_team(pool, &team).await?;
        for player in &players {
            insert_player(pool, player).await?;
        }
    }

    info!("Seeded demo league with {DEMO_TEAM_COUNT} teams");
    Ok(DEMO_TEAM_COUNT)
}

fn demo_league() -> Vec<(Team, Vec<Player>)> {
    (0..DEMO_TEAM_COUNT)
        .map(|i| {
            let team_id = format!("team-{}", i + 1);
            let players: Vec<Player> = [i * 2 + 1, i * 2 + 2]
                .into_iter()
                .map(|n| Player {
                    id: format!("p{n}"),
                    name: format!("Player {n}"),
                    team_id: team_id.clone(),
                    current_handicap9: Some(0.0),
                })
                .collect();
            let team = Team {
                id: team_id,
                name: format!("Lake Lovers {}", i + 1),
                season_points: 0.0,
                player_ids: players.iter().map(|p| p.id.clone()).collect(),
            };
            (team, players)
        })
        .collect()
}
