use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::{FORFEIT_POINTS, HOLES, PLAYERS_PER_TEAM};
use crate::scorer::strokes::net_hole_scores;
use crate::types::{
    now_ns, round_to_tenth, HoleCard, MatchResult, PairResult, Player, PlayerPairResult, Side,
    TeamLineup,
};

/// How a pairing is decided before any hole is compared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairingOutcome<'a> {
    BothAbsent,
    /// The named side has no card; the other side takes the forfeit.
    OneAbsent(Side),
    BothPresent { a: &'a [Option<i32>], b: &'a [Option<i32>] },
}

impl<'a> PairingOutcome<'a> {
    pub fn classify(
        a: &Player,
        b: &Player,
        hole_scores: &'a HashMap<String, HoleCard>,
    ) -> Self {
        match (card_for(a, hole_scores), card_for(b, hole_scores)) {
            (None, None) => PairingOutcome::BothAbsent,
            (None, Some(_)) => PairingOutcome::OneAbsent(Side::A),
            (Some(_), None) => PairingOutcome::OneAbsent(Side::B),
            (Some(a), Some(b)) => PairingOutcome::BothPresent { a, b },
        }
    }
}

/// A player's card, or None when they no-showed (no card, an empty card, or a BYE slot).
fn card_for<'a>(player: &Player, hole_scores: &'a HashMap<String, HoleCard>) -> Option<&'a [Option<i32>]> {
    if player.is_bye() {
        return None;
    }
    hole_scores
        .get(&player.id)
        .map(Vec::as_slice)
        .filter(|card| !card.is_empty())
}

/// Points for one hole (or one aggregate): lower net wins 1, a tie halves.
pub fn compare_hole(a_net: i64, b_net: i64) -> (f64, f64) {
    match a_net.cmp(&b_net) {
        Ordering::Less => (1.0, 0.0),
        Ordering::Greater => (0.0, 1.0),
        Ordering::Equal => (0.5, 0.5),
    }
}

/// Score one positional pairing.
pub fn score_pair(
    player_a: &Player,
    player_b: &Player,
    hole_scores: &HashMap<String, HoleCard>,
    handicaps: &HashMap<String, f64>,
) -> PairResult {
    let (a, b) = match PairingOutcome::classify(player_a, player_b, hole_scores) {
        PairingOutcome::BothAbsent => (
            PlayerPairResult::unscored(&player_a.id, 0.0, true),
            PlayerPairResult::unscored(&player_b.id, 0.0, true),
        ),
        PairingOutcome::OneAbsent(Side::A) => (
            PlayerPairResult::unscored(&player_a.id, 0.0, true),
            PlayerPairResult::unscored(&player_b.id, FORFEIT_POINTS, false),
        ),
        PairingOutcome::OneAbsent(Side::B) => (
            PlayerPairResult::unscored(&player_a.id, FORFEIT_POINTS, false),
            PlayerPairResult::unscored(&player_b.id, 0.0, true),
        ),
        PairingOutcome::BothPresent { a, b } => score_played_pair(
            player_a,
            player_b,
            a,
            b,
            handicap_of(player_a, handicaps),
            handicap_of(player_b, handicaps),
        ),
    };

    PairResult {
        player_a_id: player_a.id.clone(),
        player_b_id: player_b.id.clone(),
        player_a: a,
        player_b: b,
    }
}

fn score_played_pair(
    player_a: &Player,
    player_b: &Player,
    card_a: &[Option<i32>],
    card_b: &[Option<i32>],
    handicap_a: f64,
    handicap_b: f64,
) -> (PlayerPairResult, PlayerPairResult) {
    let net_a = net_hole_scores(card_a, handicap_a);
    let net_b = net_hole_scores(card_b, handicap_b);

    let (mut holes_a, mut holes_b) = (0.0, 0.0);
    for hole in 0..HOLES {
        let (pa, pb) = compare_hole(net_a[hole], net_b[hole]);
        holes_a += pa;
        holes_b += pb;
    }

    let total_a: i64 = net_a.iter().sum();
    let total_b: i64 = net_b.iter().sum();
    let (agg_a, agg_b) = compare_hole(total_a, total_b);

    let result = |player: &Player, net: [i64; HOLES], holes: f64, total: i64, agg: f64| PlayerPairResult {
        id: player.id.clone(),
        hole_net: net.to_vec(),
        hole_points: round_to_tenth(holes),
        total_net: total,
        points: round_to_tenth(holes + agg),
        no_show: false,
    };

    (
        result(player_a, net_a, holes_a, total_a, agg_a),
        result(player_b, net_b, holes_b, total_b, agg_b),
    )
}

fn handicap_of(player: &Player, handicaps: &HashMap<String, f64>) -> f64 {
    handicaps.get(&player.id).copied().unwrap_or(0.0)
}

/// Order a team's players for pairing: ascending handicap, ties by id.
/// Keeps at most two and pads short rosters with BYE placeholders.
pub fn pair_players_by_handicap(players: &[Player], handicaps: &HashMap<String, f64>) -> Vec<Player> {
    let mut sorted = players.to_vec();
    sorted.sort_by(|a, b| {
        handicap_of(a, handicaps)
            .total_cmp(&handicap_of(b, handicaps))
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted.truncate(PLAYERS_PER_TEAM);
    while sorted.len() < PLAYERS_PER_TEAM {
        sorted.push(Player::bye(sorted.len()));
    }
    sorted
}

/// Score a full 2-vs-2 match. Never fails: absent cards become no-shows,
/// absent handicaps count as scratch.
pub fn compute_match_result(
    team_a: &TeamLineup,
    team_b: &TeamLineup,
    hole_scores: &HashMap<String, HoleCard>,
    handicaps: &HashMap<String, f64>,
) -> MatchResult {
    let lineup_a = pair_players_by_handicap(&team_a.players, handicaps);
    let lineup_b = pair_players_by_handicap(&team_b.players, handicaps);

    let pairs: Vec<PairResult> = lineup_a
        .iter()
        .zip(lineup_b.iter())
        .map(|(a, b)| score_pair(a, b, hole_scores, handicaps))
        .collect();

    let team_a_score: f64 = pairs.iter().map(|p| p.player_a.points).sum();
    let team_b_score: f64 = pairs.iter().map(|p| p.player_b.points).sum();

    MatchResult {
        team_a_id: team_a.id.clone(),
        team_b_id: team_b.id.clone(),
        date_ns: now_ns(),
        pairs,
        team_a_score: round_to_tenth(team_a_score),
        team_b_score: round_to_tenth(team_b_score),
    }
}

/// Each player's cached handicap, scratch when none has been computed yet.
pub fn handicaps_from_players(players: &[Player]) -> HashMap<String, f64> {
    players
        .iter()
        .map(|p| (p.id.clone(), p.current_handicap9.unwrap_or(0.0)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
