use std::sync::Arc;

use dashmap::DashMap;

use crate::types::{Player, Team, TeamLineup};

// ---------------------------------------------------------------------------
// RosterStore
// ---------------------------------------------------------------------------

/// In-memory copy of the league roster. Loaded from the database at startup and
/// written through by the API and the handicap refresher.
pub struct RosterStore {
    /// player_id → Player
    players: DashMap<String, Player>,
    /// team_id → Team
    teams: DashMap<String, Team>,
}

impl RosterStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_player(&self, player: Player) {
        self.players.insert(player.id.clone(), player);
    }

    pub fn add_team(&self, team: Team) {
        self.teams.insert(team.id.clone(), team);
    }

    pub fn load(&self, players: Vec<Player>, teams: Vec<Team>) {
        for player in players {
            self.add_player(player);
        }
        for team in teams {
            self.add_team(team);
        }
    }

    pub fn get_player(&self, player_id: &str) -> Option<Player> {
        self.players.get(player_id).map(|p| p.clone())
    }

    pub fn get_team(&self, team_id: &str) -> Option<Team> {
        self.teams.get(team_id).map(|t| t.clone())
    }

    /// Players sorted by name.
    pub fn players(&self) -> Vec<Player> {
        let mut players: Vec<Player> = self.players.iter().map(|e| e.value().clone()).collect();
        players.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        players
    }

    pub fn teams(&self) -> Vec<Team> {
        self.teams.iter().map(|e| e.value().clone()).collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// The team's designated players as fielded for a match. Designated ids that
    /// are not on the roster are dropped and later padded with BYE slots.
    pub fn lineup(&self, team_id: &str) -> Option<TeamLineup> {
        let team = self.get_team(team_id)?;
        let players = team
            .player_ids
            .iter()
            .filter_map(|id| self.get_player(id))
            .collect();
        Some(TeamLineup { id: team.id, players })
    }

    /// Returns false if the player is not on the roster.
    pub fn set_handicap(&self, player_id: &str, handicap9: f64) -> bool {
        match self.players.get_mut(player_id) {
            Some(mut player) => {
                player.current_handicap9 = Some(handicap9);
                true
            }
            None => false,
        }
    }

    /// Set the handicap only if the cached value is still `expected`. Returns
    /// false when the player is unknown or someone else updated it first.
    pub fn replace_handicap(&self, player_id: &str, expected: Option<f64>, handicap9: f64) -> bool {
        match self.players.get_mut(player_id) {
            Some(mut player) if player.current_handicap9 == expected => {
                player.current_handicap9 = Some(handicap9);
                true
            }
            _ => false,
        }
    }

    /// Add match points to a team's season total. Returns the new total.
    pub fn credit_season_points(&self, team_id: &str, points: f64) -> Option<f64> {
        let mut team = self.teams.get_mut(team_id)?;
        team.season_points = crate::types::round_to_tenth(team.season_points + points);
        Some(team.season_points)
    }
}

impl Default for RosterStore {
    fn default() -> Self {
        Self {
            players: DashMap::new(),
            teams: DashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
