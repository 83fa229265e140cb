use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A completed match observation. `(date, home_team, away_team)` is the
/// natural key; duplicates are tolerated and treated as independent
/// observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    /// Four-digit season code, `YYNN` = season 20YY-20NN (e.g. "2425").
    pub season: String,
    /// Opaque league code such as `ENG1`. The `SCO` prefix selects
    /// double-round-robin fixture enumeration.
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
}

/// Fitted model state: global home advantage, fixed Dixon-Coles rho and the
/// per-team attack/defense ratings (zero-sum across all known teams).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MleParams {
    pub home_advantage: f64,
    pub rho: f64,
    pub attack_ratings: BTreeMap<String, f64>,
    pub defense_ratings: BTreeMap<String, f64>,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl MleParams {
    /// Per-match goal expectations for a (home, away) pairing. Unknown teams
    /// rate as average (0.0), so the lambdas are always finite and positive.
    pub fn match_lambdas(&self, home_team: &str, away_team: &str) -> (f64, f64) {
        let home_attack = self.attack_ratings.get(home_team).copied().unwrap_or(0.0);
        let home_defense = self.defense_ratings.get(home_team).copied().unwrap_or(0.0);
        let away_attack = self.attack_ratings.get(away_team).copied().unwrap_or(0.0);
        let away_defense = self.defense_ratings.get(away_team).copied().unwrap_or(0.0);

        let lambda_home = (home_attack - away_defense + self.home_advantage).exp();
        let lambda_away = (away_attack - home_defense).exp();
        (lambda_home, lambda_away)
    }
}

/// Solver and simulation knobs. Serde defaults keep partially-specified JSON
/// configs working.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimParams {
    #[serde(default = "default_home_advantage")]
    pub home_advantage: f64,
    #[serde(default = "default_base_learning_rate")]
    pub base_learning_rate: f64,
    /// Learning-rate multiplier for teams in their first season after a
    /// league change.
    #[serde(default = "default_league_change_learning_rate")]
    pub league_change_learning_rate: f64,
    #[serde(default = "default_time_decay_base")]
    pub time_decay_base: f64,
    #[serde(default = "default_time_decay_power")]
    pub time_decay_power: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_simulation_paths")]
    pub simulation_paths: usize,
    /// Upper goal bound for score-matrix style enumerations.
    #[serde(default = "default_goal_simulation_bound")]
    pub goal_simulation_bound: u32,
    /// Weight of goal difference in the composite (float) points seed. The
    /// simulator ranks by the explicit (points, goal difference) pair, so this
    /// only matters to callers asking for the composite representation.
    #[serde(default = "default_goal_difference_effect")]
    pub goal_difference_effect: f64,
    /// Monte-Carlo seed. `None` seeds from entropy; set for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            home_advantage: default_home_advantage(),
            base_learning_rate: default_base_learning_rate(),
            league_change_learning_rate: default_league_change_learning_rate(),
            time_decay_base: default_time_decay_base(),
            time_decay_power: default_time_decay_power(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            simulation_paths: default_simulation_paths(),
            goal_simulation_bound: default_goal_simulation_bound(),
            goal_difference_effect: default_goal_difference_effect(),
            seed: None,
        }
    }
}

fn default_home_advantage() -> f64 {
    0.3
}

fn default_base_learning_rate() -> f64 {
    0.001
}

fn default_league_change_learning_rate() -> f64 {
    2.0
}

fn default_time_decay_base() -> f64 {
    0.85
}

fn default_time_decay_power() -> f64 {
    1.5
}

fn default_max_iterations() -> usize {
    200
}

fn default_tolerance() -> f64 {
    1e-6
}

fn default_simulation_paths() -> usize {
    5000
}

fn default_goal_simulation_bound() -> u32 {
    5
}

fn default_goal_difference_effect() -> f64 {
    0.1
}

/// One row of a league report: current table standing plus fitted ratings and
/// the simulated expected season points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamEntry {
    pub name: String,
    pub points: i32,
    pub goal_difference: i32,
    pub played: u32,
    pub attack_rating: f64,
    pub defense_rating: f64,
    pub lambda_home: f64,
    pub lambda_away: f64,
    pub expected_season_points: f64,
}

/// Played current-season match reshaped to the `"Home vs Away"` form used for
/// fixture bookkeeping. A missing score marks an unplayed fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<(u32, u32)>,
}
