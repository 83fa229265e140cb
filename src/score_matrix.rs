use crate::poisson::poisson_pmf;

/// Dixon-Coles correction for the correlation between home and away goals in
/// low-scoring games. Only the {0,1}x{0,1} square is adjusted; rho is
/// typically negative, which boosts 0-0 and 1-1 relative to 1-0 and 0-1.
pub fn dixon_coles_adjustment(home_goals: u32, away_goals: u32, rho: f64) -> f64 {
    match (home_goals, away_goals) {
        (0, 0) => 1.0 - rho,
        (0, 1) => 1.0 + rho,
        (1, 0) => 1.0 + rho,
        (1, 1) => 1.0 - rho,
        _ => 1.0,
    }
}

/// Joint distribution of (home goals, away goals) up to a bound: the outer
/// product of two Poisson PMFs with the Dixon-Coles adjustment applied.
///
/// The bound truncates the tails, so `total_probability()` is slightly below
/// 1; derived quantities are sums over the retained mass.
#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    bound: u32,
    matrix: Vec<Vec<f64>>,
}

impl ScoreMatrix {
    pub fn new(lambda_home: f64, lambda_away: f64, rho: f64, bound: u32) -> Self {
        let size = bound as usize + 1;
        let mut matrix = vec![vec![0.0; size]; size];
        for home_goals in 0..=bound {
            for away_goals in 0..=bound {
                let prob_home = poisson_pmf(lambda_home, home_goals as i64);
                let prob_away = poisson_pmf(lambda_away, away_goals as i64);
                let adjustment = dixon_coles_adjustment(home_goals, away_goals, rho);
                matrix[home_goals as usize][away_goals as usize] =
                    prob_home * prob_away * adjustment;
            }
        }
        Self { bound, matrix }
    }

    pub fn bound(&self) -> u32 {
        self.bound
    }

    /// 1X2 probabilities as `(home_win, draw, away_win)`.
    pub fn match_odds(&self) -> (f64, f64, f64) {
        let mut home_win = 0.0;
        let mut draw = 0.0;
        let mut away_win = 0.0;
        for (home_goals, row) in self.matrix.iter().enumerate() {
            for (away_goals, prob) in row.iter().enumerate() {
                if home_goals > away_goals {
                    home_win += prob;
                } else if home_goals == away_goals {
                    draw += prob;
                } else {
                    away_win += prob;
                }
            }
        }
        (home_win, draw, away_win)
    }

    /// Probability of total goals strictly over the threshold, and the
    /// complement within the matrix.
    pub fn over_under(&self, threshold: u32) -> (f64, f64) {
        let mut over = 0.0;
        let mut under = 0.0;
        for (home_goals, row) in self.matrix.iter().enumerate() {
            for (away_goals, prob) in row.iter().enumerate() {
                if home_goals + away_goals > threshold as usize {
                    over += prob;
                } else {
                    under += prob;
                }
            }
        }
        (over, under)
    }

    /// `(both_score, not_both)` probabilities.
    pub fn both_teams_to_score(&self) -> (f64, f64) {
        let mut both = 0.0;
        let mut not_both = 0.0;
        for (home_goals, row) in self.matrix.iter().enumerate() {
            for (away_goals, prob) in row.iter().enumerate() {
                if home_goals > 0 && away_goals > 0 {
                    both += prob;
                } else {
                    not_both += prob;
                }
            }
        }
        (both, not_both)
    }

    pub fn correct_score(&self, home_goals: u32, away_goals: u32) -> f64 {
        if home_goals > self.bound || away_goals > self.bound {
            return 0.0;
        }
        self.matrix[home_goals as usize][away_goals as usize]
    }

    /// Expected (home, away) goals over the retained mass.
    pub fn expected_goals(&self) -> (f64, f64) {
        let mut home_expected = 0.0;
        let mut away_expected = 0.0;
        for (home_goals, row) in self.matrix.iter().enumerate() {
            for (away_goals, prob) in row.iter().enumerate() {
                home_expected += home_goals as f64 * prob;
                away_expected += away_goals as f64 * prob;
            }
        }
        (home_expected, away_expected)
    }

    /// Sum of all entries; below 1.0 by the truncated tail mass.
    pub fn total_probability(&self) -> f64 {
        self.matrix.iter().flatten().sum()
    }

    /// Expected (home, away) league points for this match from the 1X2
    /// probabilities: 3 per win, 1 per draw.
    pub fn expected_match_points(&self) -> (f64, f64) {
        let (home_win, draw, away_win) = self.match_odds();
        (3.0 * home_win + draw, 3.0 * away_win + draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjustment_table() {
        let rho = -0.1;
        assert_eq!(dixon_coles_adjustment(0, 0, rho), 1.1);
        assert_eq!(dixon_coles_adjustment(0, 1, rho), 0.9);
        assert_eq!(dixon_coles_adjustment(1, 0, rho), 0.9);
        assert_eq!(dixon_coles_adjustment(1, 1, rho), 1.1);
        assert_eq!(dixon_coles_adjustment(2, 1, rho), 1.0);
        assert_eq!(dixon_coles_adjustment(0, 2, rho), 1.0);
    }

    #[test]
    fn zero_rho_reduces_to_raw_poisson() {
        let matrix = ScoreMatrix::new(1.4, 1.1, 0.0, 5);
        for home_goals in 0..=1u32 {
            for away_goals in 0..=1u32 {
                let raw = poisson_pmf(1.4, home_goals as i64) * poisson_pmf(1.1, away_goals as i64);
                let adjusted = matrix.correct_score(home_goals, away_goals);
                assert!((raw - adjusted).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn total_probability_near_one_for_generous_bound() {
        let matrix = ScoreMatrix::new(1.4, 1.1, -0.1, 10);
        let total = matrix.total_probability();
        assert!(total > 0.999 && total <= 1.0 + 1e-9, "total {total}");
    }

    #[test]
    fn match_odds_partition_the_matrix() {
        let matrix = ScoreMatrix::new(1.8, 0.9, -0.1, 6);
        let (home_win, draw, away_win) = matrix.match_odds();
        let total = matrix.total_probability();
        assert!((home_win + draw + away_win - total).abs() < 1e-12);
        assert!(home_win > away_win);
    }

    #[test]
    fn over_under_partitions_the_matrix() {
        let matrix = ScoreMatrix::new(1.3, 1.2, -0.1, 6);
        let (over, under) = matrix.over_under(2);
        assert!((over + under - matrix.total_probability()).abs() < 1e-12);
    }

    #[test]
    fn expected_goals_track_lambdas() {
        let matrix = ScoreMatrix::new(1.4, 1.1, 0.0, 12);
        let (home_expected, away_expected) = matrix.expected_goals();
        assert!((home_expected - 1.4).abs() < 1e-3);
        assert!((away_expected - 1.1).abs() < 1e-3);
    }

    #[test]
    fn btts_complement() {
        let matrix = ScoreMatrix::new(1.4, 1.1, -0.1, 6);
        let (both, not_both) = matrix.both_teams_to_score();
        assert!((both + not_both - matrix.total_probability()).abs() < 1e-12);
        assert!(both > 0.0 && not_both > 0.0);
    }
}
