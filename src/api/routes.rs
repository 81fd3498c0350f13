use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::api::health::HealthState;
use crate::config::{list_limits, HANDICAP_WINDOW};
use crate::db::queries;
use crate::error::{AppError, Result};
use crate::handicap::compute_handicap9;
use crate::scorer::{compute_match_result, handicaps_from_players};
use crate::standings::{season_standings, team_aggregates, StandingRow, TeamAggregate};
use crate::state::RosterStore;
use crate::types::{now_ns, HoleCard, LeagueEvent, MatchResult, Player, Round, TeamLineup};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    pub roster: Arc<RosterStore>,
    pub health: Arc<HealthState>,
    pub event_tx: mpsc::Sender<LeagueEvent>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/players", get(get_players))
        .route("/players/:id/rounds", get(get_player_rounds))
        .route("/players/:id/handicap", get(get_player_handicap))
        .route("/rounds", post(post_round))
        .route("/rounds/recent", get(get_recent_rounds))
        .route("/teams/standings", get(get_standings))
        .route("/leaderboard", get(get_leaderboard))
        .route("/matches/preview", post(post_match_preview))
        .route("/matches", post(post_match))
        .route("/matches/recent", get(get_recent_matches))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / query structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct SubmitRoundRequest {
    pub player_id: String,
    pub course_par: Option<i32>,
    pub hole_scores: Vec<i32>,
}

#[derive(Deserialize)]
pub struct MatchRequest {
    pub team_a_id: String,
    pub team_b_id: String,
    /// player_id → card. Players without an entry (or with an empty card) no-show.
    #[serde(default)]
    pub hole_scores: HashMap<String, HoleCard>,
    /// Optional per-player overrides, applied on top of `handicap_source`.
    #[serde(default)]
    pub handicaps: HashMap<String, f64>,
    #[serde(default)]
    pub handicap_source: HandicapSource,
}

/// Where match handicaps come from when no override is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandicapSource {
    /// Recompute from each player's stored rounds.
    #[default]
    Fresh,
    /// Use the roster's cached `current_handicap9`.
    Cached,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub players: usize,
    pub teams: usize,
    pub rounds_submitted: u64,
    pub matches_recorded: u64,
    pub write_queue_pending: u64,
    pub last_refresh_at_ns: u64,
}

#[derive(Debug, Serialize)]
pub struct HandicapResponse {
    pub player_id: String,
    pub handicap9: f64,
    pub rounds_considered: usize,
}

#[derive(Debug, Serialize)]
pub struct RoundSubmittedResponse {
    pub round: Round,
    pub handicap9: f64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        players: state.roster.player_count(),
        teams: state.roster.team_count(),
        rounds_submitted: state.health.rounds_submitted(),
        matches_recorded: state.health.matches_recorded(),
        write_queue_pending: state.health.write_queue_pending(),
        last_refresh_at_ns: state.health.last_refresh_at_ns(),
    })
}

async fn get_players(State(state): State<ApiState>) -> Json<Vec<Player>> {
    Json(state.roster.players())
}

async fn get_player_rounds(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<Round>>> {
    require_player(&state, &player_id)?;
    let limit = page_limit(params.limit, list_limits::PLAYER_ROUNDS);
    Ok(Json(queries::player_rounds(&state.pool, &player_id, limit).await?))
}

async fn get_player_handicap(
    State(state): State<ApiState>,
    Path(player_id): Path<String>,
) -> Result<Json<HandicapResponse>> {
    require_player(&state, &player_id)?;
    let rounds = queries::player_rounds(&state.pool, &player_id, HANDICAP_WINDOW as i64).await?;
    Ok(Json(HandicapResponse {
        handicap9: compute_handicap9(&rounds),
        rounds_considered: rounds.len(),
        player_id,
    }))
}

async fn post_round(
    State(state): State<ApiState>,
    Json(body): Json<SubmitRoundRequest>,
) -> Result<Json<RoundSubmittedResponse>> {
    require_player(&state, &body.player_id)?;
    let round = Round::new(body.player_id, body.course_par, body.hole_scores, now_ns())?;
    queries::insert_round(&state.pool, &round).await?;

    let history = queries::player_rounds(&state.pool, &round.player_id, HANDICAP_WINDOW as i64).await?;
    let handicap9 = compute_handicap9(&history);
    state.roster.set_handicap(&round.player_id, handicap9);
    state.health.inc_rounds_submitted();
    // Cached handicaps are persisted by the writer so they land in queue order.
    queue_event(
        &state,
        LeagueEvent::HandicapRefreshed { player_id: round.player_id.clone(), handicap9 },
    )
    .await?;

    info!(
        event = "ROUND_SUBMITTED",
        player_id = %round.player_id,
        gross = round.gross_score,
        handicap9,
        "ROUND | player: {} | gross: {} | differential: {} | handicap9: {:.1}",
        round.player_id, round.gross_score, round.resolved_differential(), handicap9,
    );

    Ok(Json(RoundSubmittedResponse { round, handicap9 }))
}

async fn get_recent_rounds(
    State(state): State<ApiState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<Round>>> {
    let limit = page_limit(params.limit, list_limits::RECENT_ROUNDS);
    Ok(Json(queries::recent_rounds(&state.pool, limit).await?))
}

async fn get_standings(State(state): State<ApiState>) -> Json<Vec<StandingRow>> {
    Json(season_standings(&state.roster.teams()))
}

async fn get_leaderboard(State(state): State<ApiState>) -> Result<Json<Vec<TeamAggregate>>> {
    let rounds = queries::recent_rounds(&state.pool, list_limits::RECENT_ROUNDS).await?;
    Ok(Json(team_aggregates(&rounds, &state.roster.players(), &state.roster.teams())))
}

async fn post_match_preview(
    State(state): State<ApiState>,
    Json(body): Json<MatchRequest>,
) -> Result<Json<MatchResult>> {
    Ok(Json(score_match(&state, &body).await?))
}

async fn post_match(
    State(state): State<ApiState>,
    Json(body): Json<MatchRequest>,
) -> Result<Json<MatchResult>> {
    let result = score_match(&state, &body).await?;
    // Season points are credited by the writer once the match is committed.
    queue_event(&state, LeagueEvent::MatchRecorded(result.clone())).await?;
    Ok(Json(result))
}

async fn get_recent_matches(
    State(state): State<ApiState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<MatchResult>>> {
    let limit = page_limit(params.limit, list_limits::RECENT_MATCHES);
    Ok(Json(queries::recent_matches(&state.pool, limit).await?))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Requested page size clamped to `1..=max`; SQLite reads a negative LIMIT as unbounded.
fn page_limit(requested: Option<i64>, max: i64) -> i64 {
    requested.unwrap_or(max).clamp(1, max)
}

async fn queue_event(state: &ApiState, event: LeagueEvent) -> Result<()> {
    state.health.inc_write_queue_pending();
    if let Err(e) = state.event_tx.send(event).await {
        state.health.dec_write_queue_pending();
        return Err(AppError::ChannelSend(e.to_string()));
    }
    Ok(())
}

fn require_player(state: &ApiState, player_id: &str) -> Result<Player> {
    state
        .roster
        .get_player(player_id)
        .ok_or_else(|| AppError::NotFound(format!("player {player_id}")))
}

fn require_lineup(state: &ApiState, team_id: &str) -> Result<TeamLineup> {
    state
        .roster
        .lineup(team_id)
        .ok_or_else(|| AppError::NotFound(format!("team {team_id}")))
}

/// Resolve both lineups and every fielded player's handicap, then run the scorer.
async fn score_match(state: &ApiState, body: &MatchRequest) -> Result<MatchResult> {
    if body.team_a_id == body.team_b_id {
        return Err(AppError::Validation("a team cannot play itself".to_string()));
    }
    let team_a = require_lineup(state, &body.team_a_id)?;
    let team_b = require_lineup(state, &body.team_b_id)?;

    let fielded: Vec<Player> = team_a.players.iter().chain(team_b.players.iter()).cloned().collect();
    let mut handicaps = match body.handicap_source {
        HandicapSource::Cached => handicaps_from_players(&fielded),
        HandicapSource::Fresh => {
            let mut fresh = HashMap::new();
            for player in &fielded {
                let rounds =
                    queries::player_rounds(&state.pool, &player.id, HANDICAP_WINDOW as i64).await?;
                fresh.insert(player.id.clone(), compute_handicap9(&rounds));
            }
            fresh
        }
    };
    handicaps.extend(body.handicaps.iter().map(|(id, h)| (id.clone(), *h)));

    Ok(compute_match_result(&team_a, &team_b, &body.hole_scores, &handicaps))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::tests::test_pool;
    use crate::db::seed::seed_demo_league;
    use crate::db::writer::DbWriter;

    async fn seeded_state() -> (ApiState, mpsc::Receiver<LeagueEvent>) {
        let pool = test_pool().await;
        seed_demo_league(&pool).await.unwrap();
        let roster = RosterStore::new();
        roster.load(
            queries::load_players(&pool).await.unwrap(),
            queries::load_teams(&pool).await.unwrap(),
        );
        let (event_tx, event_rx) = mpsc::channel(8);
        let state = ApiState { pool, roster, health: Arc::new(HealthState::new()), event_tx };
        (state, event_rx)
    }

    fn card(holes: [i32; 9]) -> HoleCard {
        holes.into_iter().map(Some).collect()
    }

    #[tokio::test]
    async fn submitting_a_round_refreshes_the_handicap() {
        let (state, mut rx) = seeded_state().await;
        let body = SubmitRoundRequest {
            player_id: "p1".into(),
            course_par: None,
            hole_scores: vec![5, 5, 5, 5, 5, 4, 4, 4, 4],
        };

        let Json(resp) = post_round(State(state.clone()), Json(body)).await.unwrap();
        assert_eq!(resp.round.gross_score, 41);
        assert_eq!(resp.round.differential, Some(5));
        assert_eq!(resp.handicap9, 1.0);
        assert_eq!(state.roster.get_player("p1").unwrap().current_handicap9, Some(1.0));
        assert_eq!(state.health.rounds_submitted(), 1);
        assert!(matches!(
            rx.try_recv(),
            Ok(LeagueEvent::HandicapRefreshed { ref player_id, handicap9 }) if player_id == "p1" && handicap9 == 1.0
        ));

        let Json(h) = get_player_handicap(State(state.clone()), Path("p1".into())).await.unwrap();
        assert_eq!(h.handicap9, 1.0);
        assert_eq!(h.rounds_considered, 1);
    }

    #[tokio::test]
    async fn malformed_or_unknown_rounds_are_rejected() {
        let (state, _rx) = seeded_state().await;
        let short = SubmitRoundRequest { player_id: "p1".into(), course_par: None, hole_scores: vec![4; 5] };
        assert!(matches!(
            post_round(State(state.clone()), Json(short)).await,
            Err(AppError::Validation(_))
        ));

        let huge = SubmitRoundRequest { player_id: "p1".into(), course_par: None, hole_scores: vec![i32::MAX; 9] };
        assert!(matches!(
            post_round(State(state.clone()), Json(huge)).await,
            Err(AppError::Validation(_))
        ));

        let ghost = SubmitRoundRequest { player_id: "ghost".into(), course_par: None, hole_scores: vec![4; 9] };
        assert!(matches!(
            post_round(State(state.clone()), Json(ghost)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn preview_scores_without_recording() {
        let (state, mut rx) = seeded_state().await;
        // team-1 fields p1, p2; team-2 fields p3, p4. p4 no-shows.
        let body = MatchRequest {
            team_a_id: "team-1".into(),
            team_b_id: "team-2".into(),
            hole_scores: HashMap::from([
                ("p1".to_string(), card([4; 9])),
                ("p2".to_string(), card([5; 9])),
                ("p3".to_string(), card([5; 9])),
            ]),
            handicaps: HashMap::new(),
            handicap_source: HandicapSource::Fresh,
        };

        let Json(result) = post_match_preview(State(state.clone()), Json(body)).await.unwrap();
        assert_eq!(result.pairs[0].player_a_id, "p1");
        assert_eq!(result.pairs[0].player_b_id, "p3");
        assert_eq!(result.pairs[0].player_a.points, 10.0);
        assert!(result.pairs[1].player_b.no_show);
        assert_eq!(result.team_a_score, 20.0);
        assert_eq!(result.team_b_score, 0.0);
        assert!(rx.try_recv().is_err());
        assert_eq!(state.roster.get_team("team-1").unwrap().season_points, 0.0);
    }

    #[tokio::test]
    async fn recording_credits_standings_and_queues_the_write() {
        let (state, mut rx) = seeded_state().await;
        let body = MatchRequest {
            team_a_id: "team-3".into(),
            team_b_id: "team-4".into(),
            hole_scores: HashMap::from([
                ("p5".to_string(), card([4; 9])),
                ("p6".to_string(), card([4; 9])),
                ("p7".to_string(), card([4; 9])),
                ("p8".to_string(), card([4; 9])),
            ]),
            // p5 gets nine strokes: net 3 on every hole against p7
            handicaps: HashMap::from([("p5".to_string(), 9.0)]),
            handicap_source: HandicapSource::Fresh,
        };

        let Json(result) = post_match(State(state.clone()), Json(body)).await.unwrap();
        // p6 (0) sorts ahead of p5 (9): pair one p6 v p7 halves, pair two p5 v p8 goes to p5
        assert_eq!(result.pairs[0].player_a_id, "p6");
        assert_eq!(result.team_a_score, 15.0);
        assert_eq!(result.team_b_score, 5.0);

        let event = rx.try_recv().unwrap();
        assert!(matches!(event, LeagueEvent::MatchRecorded(_)));
        assert_eq!(state.health.write_queue_pending(), 1);
        // nothing is credited until the writer commits the match
        assert_eq!(state.roster.get_team("team-3").unwrap().season_points, 0.0);
        assert_eq!(state.health.matches_recorded(), 0);

        let (_tx, idle_rx) = mpsc::channel(1);
        let writer = DbWriter::new(
            state.pool.clone(),
            idle_rx,
            Arc::clone(&state.health),
            Arc::clone(&state.roster),
        );
        writer.write_event(&event).await.unwrap();

        let Json(standings) = get_standings(State(state.clone())).await;
        assert_eq!(standings[0].team_id, "team-3");
        assert_eq!(standings[0].season_points, 15.0);
        assert_eq!(standings[1].team_id, "team-4");
        assert_eq!(state.health.matches_recorded(), 1);

        let Json(recent) =
            get_recent_matches(State(state), Query(LimitQuery { limit: None })).await.unwrap();
        assert_eq!(recent, vec![result]);
    }

    #[test]
    fn page_limits_are_clamped() {
        assert_eq!(page_limit(None, 20), 20);
        assert_eq!(page_limit(Some(5), 20), 5);
        assert_eq!(page_limit(Some(-1), 20), 1);
        assert_eq!(page_limit(Some(0), 20), 1);
        assert_eq!(page_limit(Some(10_000), 20), 20);
    }

    #[tokio::test]
    async fn negative_limit_does_not_bypass_the_page_cap() {
        let (state, _rx) = seeded_state().await;
        for _ in 0..3 {
            let body = SubmitRoundRequest { player_id: "p1".into(), course_par: None, hole_scores: vec![4; 9] };
            post_round(State(state.clone()), Json(body)).await.unwrap();
        }
        let Json(rounds) = get_player_rounds(
            State(state),
            Path("p1".into()),
            Query(LimitQuery { limit: Some(-1) }),
        )
        .await
        .unwrap();
        assert_eq!(rounds.len(), 1);
    }

    #[tokio::test]
    async fn cached_source_uses_roster_handicaps() {
        let (state, _rx) = seeded_state().await;
        state.roster.set_handicap("p1", 9.0);
        let request = |source| MatchRequest {
            team_a_id: "team-1".into(),
            team_b_id: "team-2".into(),
            hole_scores: ["p1", "p2", "p3", "p4"]
                .into_iter()
                .map(|id| (id.to_string(), card([4; 9])))
                .collect(),
            handicaps: HashMap::new(),
            handicap_source: source,
        };

        let Json(cached) =
            post_match_preview(State(state.clone()), Json(request(HandicapSource::Cached))).await.unwrap();
        assert_eq!(cached.pairs[1].player_a_id, "p1");
        assert_eq!(cached.team_a_score, 15.0);

        // p1 has no stored rounds, so a fresh handicap is scratch and every hole halves
        let Json(fresh) =
            post_match_preview(State(state), Json(request(HandicapSource::Fresh))).await.unwrap();
        assert_eq!(fresh.team_a_score, 10.0);
        assert_eq!(fresh.team_b_score, 10.0);
    }

    #[tokio::test]
    async fn unknown_or_identical_teams_are_rejected() {
        let (state, _rx) = seeded_state().await;
        let same = MatchRequest {
            team_a_id: "team-1".into(),
            team_b_id: "team-1".into(),
            hole_scores: HashMap::new(),
            handicaps: HashMap::new(),
            handicap_source: HandicapSource::Fresh,
        };
        assert!(matches!(
            post_match_preview(State(state.clone()), Json(same)).await,
            Err(AppError::Validation(_))
        ));

        let missing = MatchRequest {
            team_a_id: "team-1".into(),
            team_b_id: "team-99".into(),
            hole_scores: HashMap::new(),
            handicaps: HashMap::new(),
            handicap_source: HandicapSource::Fresh,
        };
        assert!(matches!(
            post_match_preview(State(state), Json(missing)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
