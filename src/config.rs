use crate::error::{AppError, Result};

/// Holes in a league round. Every card, stroke allocation and net array has this length.
pub const HOLES: usize = 9;

/// Par assumed when a round was stored without one.
pub const DEFAULT_COURSE_PAR: i32 = 36;

/// Most recent rounds considered by the handicap calculation.
pub const HANDICAP_WINDOW: usize = 20;

/// Number of best differentials averaged into the handicap.
/// Histories shorter than this are padded with par (differential 0).
pub const HANDICAP_BEST_OF: usize = 5;

/// Points awarded to the present player when the opponent no-shows a pairing.
pub const FORFEIT_POINTS: f64 = 10.0;

/// Players fielded per team in a match. Short rosters are padded with BYE slots.
pub const PLAYERS_PER_TEAM: usize = 2;

/// Id prefix for placeholder players padding a short roster.
pub const BYE_ID_PREFIX: &str = "__bye-";

/// Channel capacity for league events routed to the DB writer.
pub const CHANNEL_CAPACITY: usize = 256;

/// Cached handicap refresh interval (seconds).
pub const HANDICAP_REFRESH_INTERVAL_SECS: u64 = 300;

/// Default page sizes for the list endpoints.
pub mod list_limits {
    pub const PLAYER_ROUNDS: i64 = 20;
    pub const RECENT_ROUNDS: i64 = 200;
    pub const RECENT_MATCHES: i64 = 100;
}

/// Teams created by the demo seed ("Lake Lovers 1" .. "Lake Lovers 20").
pub const DEMO_TEAM_COUNT: usize = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Seed a demo league into an empty database (SEED_DEMO_LEAGUE)
    pub seed_demo_league: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "league.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            seed_demo_league: parse_flag(
                &std::env::var("SEED_DEMO_LEAGUE").unwrap_or_default(),
            )?,
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        other => Err(AppError::Config(format!(
            "SEED_DEMO_LEAGUE must be true or false, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_common_spellings() {
        assert!(!parse_flag("").unwrap());
        assert!(!parse_flag("false").unwrap());
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag(" 1 ").unwrap());
    }

    #[test]
    fn flag_rejects_garbage() {
        assert!(matches!(parse_flag("maybe"), Err(AppError::Config(_))));
    }
}
