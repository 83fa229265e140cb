use std::cell::RefCell;
use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;

use crate::fixtures::parse_event_name;
use crate::poisson::poisson_sample;
use crate::types::{MleParams, TeamEntry};

/// Accumulated totals for one Monte-Carlo path, indexed by team slot.
#[derive(Debug, Clone)]
struct PathTotals {
    points: Vec<i32>,
    goal_difference: Vec<i32>,
}

/// Per-team, per-path points and goal-difference matrices for the remainder
/// of a season.
///
/// Seeded from the current league table, mutated once per simulated fixture,
/// then read-only for expected points and finishing-position queries. Teams
/// rank by the explicit (points desc, goal difference desc) pair.
pub struct SimPoints {
    team_names: Vec<String>,
    index: HashMap<String, usize>,
    paths: Vec<PathTotals>,
    /// Finishing-position distributions keyed by sorted team subset, so
    /// markets sharing a subset reuse one pass over the paths.
    position_cache: RefCell<HashMap<String, HashMap<String, Vec<f64>>>>,
}

impl SimPoints {
    /// Seeds every path with the current table standings.
    pub fn from_table(table: &[TeamEntry], n_paths: usize) -> Self {
        let team_names: Vec<String> = table.iter().map(|t| t.name.clone()).collect();
        let index = team_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let seed_points: Vec<i32> = table.iter().map(|t| t.points).collect();
        let seed_goal_diff: Vec<i32> = table.iter().map(|t| t.goal_difference).collect();
        let paths = vec![
            PathTotals {
                points: seed_points,
                goal_difference: seed_goal_diff,
            };
            n_paths
        ];

        Self {
            team_names,
            index,
            paths,
            position_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn n_paths(&self) -> usize {
        self.paths.len()
    }

    pub fn team_names(&self) -> &[String] {
        &self.team_names
    }

    /// Plays out every remaining fixture across all paths. Fixtures naming a
    /// team outside the tracked set are skipped. Paths are independent, so
    /// they run in parallel with one reproducible RNG stream per path.
    pub fn simulate_remaining(&mut self, fixtures: &[String], params: &MleParams, seed: u64) {
        let resolved: Vec<(usize, usize, f64, f64)> = fixtures
            .iter()
            .filter_map(|name| {
                let (home, away) = parse_event_name(name)?;
                let home_idx = *self.index.get(home)?;
                let away_idx = *self.index.get(away)?;
                let (lambda_home, lambda_away) = params.match_lambdas(home, away);
                Some((home_idx, away_idx, lambda_home, lambda_away))
            })
            .collect();

        self.paths
            .par_iter_mut()
            .enumerate()
            .for_each(|(path, totals)| {
                let mut rng = path_rng(seed, path);
                for &(home_idx, away_idx, lambda_home, lambda_away) in &resolved {
                    let home_goals = poisson_sample(&mut rng, lambda_home) as i32;
                    let away_goals = poisson_sample(&mut rng, lambda_away) as i32;

                    if home_goals > away_goals {
                        totals.points[home_idx] += 3;
                    } else if home_goals < away_goals {
                        totals.points[away_idx] += 3;
                    } else {
                        totals.points[home_idx] += 1;
                        totals.points[away_idx] += 1;
                    }
                    totals.goal_difference[home_idx] += home_goals - away_goals;
                    totals.goal_difference[away_idx] += away_goals - home_goals;
                }
            });

        self.position_cache.borrow_mut().clear();
    }

    /// Mean final points per team across paths.
    pub fn expected_points(&self) -> HashMap<String, f64> {
        let n = self.paths.len().max(1) as f64;
        let mut sums = vec![0.0f64; self.team_names.len()];
        for totals in &self.paths {
            for (slot, points) in totals.points.iter().enumerate() {
                sums[slot] += *points as f64;
            }
        }
        self.team_names
            .iter()
            .zip(sums)
            .map(|(name, sum)| (name.clone(), sum / n))
            .collect()
    }

    /// Finishing-position distributions over a team subset (`None` = all
    /// tracked teams). Entry `probs[team][p]` is the fraction of paths in
    /// which the team finishes at position `p` (0 = champion) among the
    /// subset. Memoised by the sorted subset key.
    pub fn position_probabilities(&self, subset: Option<&[String]>) -> HashMap<String, Vec<f64>> {
        let requested: &[String] = subset.unwrap_or(&self.team_names);

        let mut cache_key_parts: Vec<&str> = requested.iter().map(String::as_str).collect();
        cache_key_parts.sort_unstable();
        let cache_key = cache_key_parts.join("|");
        if let Some(cached) = self.position_cache.borrow().get(&cache_key) {
            return cached.clone();
        }

        let selected: Vec<(String, usize)> = requested
            .iter()
            .filter_map(|name| self.index.get(name).map(|&idx| (name.clone(), idx)))
            .collect();
        if selected.is_empty() {
            return HashMap::new();
        }

        let mut counts = vec![vec![0u64; selected.len()]; selected.len()];
        for totals in &self.paths {
            let mut order: Vec<usize> = (0..selected.len()).collect();
            order.sort_by(|&a, &b| {
                let (pa, ga) = (totals.points[selected[a].1], totals.goal_difference[selected[a].1]);
                let (pb, gb) = (totals.points[selected[b].1], totals.goal_difference[selected[b].1]);
                pb.cmp(&pa).then(gb.cmp(&ga))
            });
            for (position, &slot) in order.iter().enumerate() {
                counts[slot][position] += 1;
            }
        }

        let n = self.paths.len().max(1) as f64;
        let result: HashMap<String, Vec<f64>> = selected
            .iter()
            .enumerate()
            .map(|(slot, (name, _))| {
                let probs = counts[slot].iter().map(|&c| c as f64 / n).collect();
                (name.clone(), probs)
            })
            .collect();

        self.position_cache
            .borrow_mut()
            .insert(cache_key, result.clone());
        result
    }
}

/// Derives a stream seed per path so results are reproducible regardless of
/// how rayon partitions the work.
fn path_rng(seed: u64, path: usize) -> SmallRng {
    SmallRng::seed_from_u64(seed ^ (path as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
