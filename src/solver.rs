use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use crate::events::{find_latest_season, season_start_year};
use crate::poisson::poisson_pmf;
use crate::score_matrix::dixon_coles_adjustment;
use crate::types::{MatchResult, MleParams, SimParams};

/// Dixon-Coles low-score correlation. Fixed by design; not optimised.
pub const DEFAULT_RHO: f64 = -0.1;

/// Gradient-ascent maximum-likelihood estimator for per-team attack/defense
/// ratings over a time-weighted match archive.
///
/// The solver borrows the archive read-only and owns its parameter state.
/// Optimisation is pure: given well-formed input it cannot fail, it can only
/// run out of iterations without converging.
pub struct MleSolver<'a> {
    matches: &'a [MatchResult],
    sim_params: SimParams,
    league_change_teams: BTreeSet<String>,
    /// Most recent season each team appears in, for the adaptive rate.
    team_latest_season: HashMap<String, String>,
    latest_season: Option<String>,
    params: MleParams,
}

impl<'a> MleSolver<'a> {
    pub fn new(
        matches: &'a [MatchResult],
        sim_params: SimParams,
        league_change_teams: BTreeSet<String>,
    ) -> Self {
        let mut attack_ratings = BTreeMap::new();
        let mut defense_ratings = BTreeMap::new();
        let mut team_latest_season: HashMap<String, String> = HashMap::new();
        for m in matches {
            for team in [&m.home_team, &m.away_team] {
                attack_ratings.entry(team.clone()).or_insert(0.0);
                defense_ratings.entry(team.clone()).or_insert(0.0);
                let entry = team_latest_season.entry(team.clone()).or_default();
                if m.season > *entry {
                    *entry = m.season.clone();
                }
            }
        }

        let params = MleParams {
            home_advantage: sim_params.home_advantage,
            rho: DEFAULT_RHO,
            attack_ratings,
            defense_ratings,
            log_likelihood: 0.0,
            iterations: 0,
            converged: false,
        };

        Self {
            matches,
            sim_params,
            league_change_teams,
            team_latest_season,
            latest_season: find_latest_season(matches),
            params,
        }
    }

    /// Runs gradient ascent until the log-likelihood change drops below the
    /// tolerance or the iteration cap is hit, and returns the fitted
    /// parameters.
    pub fn optimize(mut self) -> MleParams {
        let mut prev_log_likelihood = self.log_likelihood();
        debug!(
            "starting optimisation: {} teams, {} matches, initial ll {prev_log_likelihood:.4}",
            self.params.attack_ratings.len(),
            self.matches.len()
        );

        for iter in 0..self.sim_params.max_iterations {
            self.gradient_step();
            let current = self.log_likelihood();

            if iter > 0 && (current - prev_log_likelihood).abs() < self.sim_params.tolerance {
                self.params.log_likelihood = current;
                self.params.iterations = iter + 1;
                self.params.converged = true;
                debug!("converged at iteration {} (ll {current:.4})", iter + 1);
                return self.params;
            }
            prev_log_likelihood = current;
        }

        self.params.log_likelihood = self.log_likelihood();
        self.params.iterations = self.sim_params.max_iterations;
        self.params.converged = false;
        self.params
    }

    /// Time-weighted log-likelihood of the archive under the current
    /// parameters. Non-positive joint probabilities (underflow, or a zero
    /// lambda against non-zero goals) are skipped rather than poisoning the
    /// sum.
    pub fn log_likelihood(&self) -> f64 {
        let mut log_likelihood = 0.0;
        for m in self.matches {
            let (lambda_home, lambda_away) =
                self.params.match_lambdas(&m.home_team, &m.away_team);

            let prob_home = poisson_pmf(lambda_home, m.home_goals as i64);
            let prob_away = poisson_pmf(lambda_away, m.away_goals as i64);
            let adjustment = dixon_coles_adjustment(m.home_goals, m.away_goals, self.params.rho);

            let prob = prob_home * prob_away * adjustment;
            if prob > 0.0 {
                log_likelihood += self.time_weight(&m.season) * prob.ln();
            }
        }
        log_likelihood
    }

    /// One gradient-ascent step over all matches, followed by the zero-sum
    /// renormalisation.
    fn gradient_step(&mut self) {
        let mut attack_grad: HashMap<&str, f64> = HashMap::new();
        let mut defense_grad: HashMap<&str, f64> = HashMap::new();

        for m in self.matches {
            let (lambda_home, lambda_away) =
                self.params.match_lambdas(&m.home_team, &m.away_team);
            let weight = self.time_weight(&m.season);

            let home_goals = m.home_goals as f64;
            let away_goals = m.away_goals as f64;

            *attack_grad.entry(m.home_team.as_str()).or_default() +=
                weight * (home_goals - lambda_home);
            *attack_grad.entry(m.away_team.as_str()).or_default() +=
                weight * (away_goals - lambda_away);
            *defense_grad.entry(m.home_team.as_str()).or_default() +=
                weight * (lambda_away - away_goals);
            *defense_grad.entry(m.away_team.as_str()).or_default() +=
                weight * (lambda_home - home_goals);
        }

        let rates: Vec<(String, f64)> = self
            .params
            .attack_ratings
            .keys()
            .map(|team| (team.clone(), self.adaptive_learning_rate(team)))
            .collect();

        for (team, rate) in &rates {
            if let Some(grad) = attack_grad.get(team.as_str()) {
                *self.params.attack_ratings.get_mut(team).unwrap() += rate * grad;
            }
            if let Some(grad) = defense_grad.get(team.as_str()) {
                *self.params.defense_ratings.get_mut(team).unwrap() += rate * grad;
            }
        }

        self.normalize_ratings();
    }

    /// Removes the gauge freedom `a -> a+c, d -> d+c` by recentering both
    /// rating families on zero after every step.
    fn normalize_ratings(&mut self) {
        let count = self.params.attack_ratings.len() as f64;
        if count == 0.0 {
            return;
        }
        let attack_mean: f64 = self.params.attack_ratings.values().sum::<f64>() / count;
        let defense_mean: f64 = self.params.defense_ratings.values().sum::<f64>() / count;
        for value in self.params.attack_ratings.values_mut() {
            *value -= attack_mean;
        }
        for value in self.params.defense_ratings.values_mut() {
            *value -= defense_mean;
        }
    }

    /// Seasonal discount `base^(years_ago * power)`. A malformed season code
    /// is diagnosed and falls back to full weight.
    pub fn time_weight(&self, season: &str) -> f64 {
        let Some(latest) = self.latest_season.as_deref() else {
            return 1.0;
        };
        let latest_year = match season_start_year(latest) {
            Ok(year) => year,
            Err(err) => {
                debug!("cannot parse latest season {latest:?}: {err}; using weight 1.0");
                return 1.0;
            }
        };
        let season_year = match season_start_year(season) {
            Ok(year) => year,
            Err(err) => {
                debug!("cannot parse season {season:?}: {err}; using weight 1.0");
                return 1.0;
            }
        };

        let years_ago = (latest_year - season_year) as f64;
        self.sim_params
            .time_decay_base
            .powf(years_ago * self.sim_params.time_decay_power)
    }

    /// Teams in their first season after a league change learn faster: the
    /// rate decays linearly from `league_change_learning_rate * base` toward
    /// `base`, with the latest season's time weight as the decay fraction.
    fn adaptive_learning_rate(&self, team: &str) -> f64 {
        let base = self.sim_params.base_learning_rate;
        let in_latest = match (
            self.team_latest_season.get(team),
            self.latest_season.as_deref(),
        ) {
            (Some(season), Some(latest)) => season == latest,
            _ => false,
        };
        if !in_latest || !self.league_change_teams.contains(team) {
            return base;
        }
        let Some(latest) = self.latest_season.as_deref() else {
            return base;
        };
        let boost = self.sim_params.league_change_learning_rate;
        let factor = boost - (boost - 1.0) * self.time_weight(latest);
        base * factor
    }
}
