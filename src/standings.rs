use std::collections::HashMap;

use serde::Serialize;

use crate::types::{Player, Round, Team};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingRow {
    pub rank: usize,
    pub team_id: String,
    pub name: String,
    pub season_points: f64,
}

/// Season table: most points first, ties alphabetical by team name.
pub fn season_standings(teams: &[Team]) -> Vec<StandingRow> {
    let mut sorted: Vec<&Team> = teams.iter().collect();
    sorted.sort_by(|a, b| {
        b.season_points
            .total_cmp(&a.season_points)
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, t)| StandingRow {
            rank: idx + 1,
            team_id: t.id.clone(),
            name: t.name.clone(),
            season_points: t.season_points,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAggregate {
    pub team_id: String,
    pub name: String,
    /// Sum of differentials over the rounds considered. Lower is better.
    pub total: i32,
    pub rounds: usize,
}

/// Live team aggregates over a batch of recent rounds.
///
/// Rounds from players missing from the roster are skipped. Teams with no
/// rounds in the batch do not appear.
pub fn team_aggregates(rounds: &[Round], players: &[Player], teams: &[Team]) -> Vec<TeamAggregate> {
    let team_of: HashMap<&str, &str> = players
        .iter()
        .map(|p| (p.id.as_str(), p.team_id.as_str()))
        .collect();
    let team_names: HashMap<&str, &str> = teams
        .iter()
        .map(|t| (t.id.as_str(), t.name.as_str()))
        .collect();

    let mut totals: HashMap<&str, (i32, usize)> = HashMap::new();
    for round in rounds {
        let Some(team_id) = team_of.get(round.player_id.as_str()).filter(|t| !t.is_empty()) else {
            continue;
        };
        let entry = totals.entry(*team_id).or_insert((0, 0));
        entry.0 += round.resolved_differential();
        entry.1 += 1;
    }

    let mut ranking: Vec<TeamAggregate> = totals
        .into_iter()
        .map(|(team_id, (total, rounds))| TeamAggregate {
            team_id: team_id.to_string(),
            name: team_names.get(team_id).copied().unwrap_or(team_id).to_string(),
            total,
            rounds,
        })
        .collect();
    ranking.sort_by(|a, b| a.total.cmp(&b.total).then_with(|| a.team_id.cmp(&b.team_id)));
    ranking
}
