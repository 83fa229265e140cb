use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use anyhow::Result;
use log::{debug, info};
use serde::Serialize;

use crate::events::{
    detect_league_change_teams, extract_global_entities, find_latest_season, group_by_league,
    teams_in_season,
};
use crate::fixtures::{league_table, matches_to_events, remaining_fixtures, rounds_for_league};
use crate::markets::{Market, init_markets};
use crate::marks::calculate_mark_values;
use crate::simulator::SimPoints;
use crate::solver::MleSolver;
use crate::types::{MatchResult, MleParams, SimParams, TeamEntry};
use crate::validation::{ValidationErrors, validate_archive, validate_league_groups};

/// Everything one projection run consumes. The orchestrator owns the archive
/// and its derived caches for the duration of the run.
#[derive(Debug, Clone, Default)]
pub struct ProjectionRequest {
    pub matches: Vec<MatchResult>,
    pub markets: Vec<Market>,
    /// Optional authoritative team lists; a listed league supersedes the
    /// teams-in-latest-season inference.
    pub league_groups: HashMap<String, Vec<String>>,
    /// Optional signed starting-points adjustments.
    pub handicaps: HashMap<String, i32>,
    pub params: SimParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeagueProjection {
    /// Team table sorted by expected season points, descending.
    pub table: Vec<TeamEntry>,
    /// market name -> team -> mark value, restricted to each market's teams.
    pub marks: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionResult {
    pub leagues: BTreeMap<String, LeagueProjection>,
    pub markets: Vec<Market>,
    pub mle_params: MleParams,
    pub latest_season: String,
    pub total_matches: usize,
    #[serde(with = "duration_millis")]
    pub processing_time: Duration,
}

/// Fits ratings over the full archive, then projects every discovered league
/// to the end of its current season and evaluates the supplied markets.
pub fn run_projection(request: ProjectionRequest) -> Result<ProjectionResult> {
    let started = Instant::now();
    let ProjectionRequest {
        mut matches,
        mut markets,
        league_groups,
        handicaps,
        params,
    } = request;

    let entities = extract_global_entities(&matches);
    let latest_season = find_latest_season(&matches).unwrap_or_default();
    let by_league = group_by_league(&matches);

    // Authoritative team list per league: the configured group if present,
    // else whoever appears in the league's latest-season matches. Leagues are
    // discovered from the data, never hard-coded.
    let mut league_teams: HashMap<String, Vec<String>> = HashMap::new();
    for league in by_league.keys().chain(league_groups.keys()) {
        if league_teams.contains_key(league) {
            continue;
        }
        let teams = match league_groups.get(league) {
            Some(group) => group.clone(),
            None => {
                let league_matches = by_league.get(league).map(Vec::as_slice).unwrap_or(&[]);
                teams_in_season(league_matches, &latest_season)
                    .into_iter()
                    .collect()
            }
        };
        league_teams.insert(league.clone(), teams);
    }

    // One up-front validation pass; every problem is reported together.
    let mut errors = ValidationErrors::default();
    validate_archive(&matches, &handicaps, &entities, &mut errors);
    validate_league_groups(&league_groups, &entities, &mut errors);
    if let Err(market_errors) = init_markets(&mut markets, &league_teams) {
        errors.errors.extend(market_errors.errors);
    }
    errors.into_result()?;

    let league_change_teams = detect_league_change_teams(&matches);
    debug!(
        "{} teams flagged for league-change learning",
        league_change_teams.len()
    );

    matches.sort_by(|a, b| a.date.cmp(&b.date));
    let mle_params = MleSolver::new(&matches, params, league_change_teams).optimize();
    info!(
        "fit complete: {} iterations, converged={}, ll={:.2}",
        mle_params.iterations, mle_params.converged, mle_params.log_likelihood
    );

    let seed = params.seed.unwrap_or_else(rand::random::<u64>);

    let mut leagues = BTreeMap::new();
    for (league, team_names) in league_teams.iter().collect::<BTreeMap<_, _>>() {
        let league_matches: Vec<MatchResult> = matches
            .iter()
            .filter(|m| &m.league == league && m.season == latest_season)
            .cloned()
            .collect();
        let events = matches_to_events(&league_matches, &latest_season);

        let table = league_table(team_names, &events, &handicaps);
        let rounds = rounds_for_league(league);
        let remaining = remaining_fixtures(team_names, &events, rounds);
        debug!(
            "{league}: {} table rows, {} remaining fixtures",
            table.len(),
            remaining.len()
        );

        let mut sim_points = SimPoints::from_table(&table, params.simulation_paths);
        sim_points.simulate_remaining(&remaining, &mle_params, league_seed(seed, league));
        let expected_points = sim_points.expected_points();

        let mut rows: Vec<TeamEntry> = table
            .into_iter()
            .map(|mut row| {
                let attack = mle_params.attack_ratings.get(&row.name).copied().unwrap_or(0.0);
                let defense = mle_params.defense_ratings.get(&row.name).copied().unwrap_or(0.0);
                row.attack_rating = attack;
                row.defense_rating = defense;
                row.lambda_home = (attack + mle_params.home_advantage).exp();
                row.lambda_away = attack.exp();
                row.expected_season_points =
                    expected_points.get(&row.name).copied().unwrap_or(row.points as f64);
                row
            })
            .collect();
        rows.sort_by(|a, b| b.expected_season_points.total_cmp(&a.expected_season_points));

        let marks = calculate_mark_values(&sim_points, &markets, league);
        leagues.insert(
            league.clone(),
            LeagueProjection { table: rows, marks },
        );
    }

    Ok(ProjectionResult {
        leagues,
        markets,
        mle_params,
        latest_season,
        total_matches: matches.len(),
        processing_time: started.elapsed(),
    })
}

/// Distinct but reproducible simulation stream per league.
fn league_seed(seed: u64, league: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    league.hash(&mut hasher);
    seed ^ hasher.finish()
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
