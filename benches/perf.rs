use std::collections::BTreeSet;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use outrights::markets::parse_payoff;
use outrights::score_matrix::ScoreMatrix;
use outrights::simulator::SimPoints;
use outrights::solver::MleSolver;
use outrights::types::{MatchResult, SimParams, TeamEntry};

fn synthetic_archive(n_teams: usize, seasons: &[&str]) -> Vec<MatchResult> {
    let mut matches = Vec::new();
    for season in seasons {
        for i in 0..n_teams {
            for j in 0..n_teams {
                if i == j {
                    continue;
                }
                let (home_goals, away_goals) = ((i % 3) as u32, (j % 2) as u32);
                matches.push(MatchResult {
                    date: format!("20{}-{:02}-{:02}", &season[..2], 1 + i % 12, 1 + j % 28),
                    season: season.to_string(),
                    league: "ENG1".to_string(),
                    home_team: format!("Club {i:02}"),
                    away_team: format!("Club {j:02}"),
                    home_goals,
                    away_goals,
                });
            }
        }
    }
    matches
}

fn bench_score_matrix(c: &mut Criterion) {
    c.bench_function("score_matrix_build", |b| {
        b.iter(|| {
            let matrix = ScoreMatrix::new(black_box(1.45), black_box(1.12), -0.1, 5);
            black_box(matrix.match_odds());
        })
    });
}

fn bench_log_likelihood(c: &mut Criterion) {
    let matches = synthetic_archive(20, &["2324", "2425"]);
    let solver = MleSolver::new(&matches, SimParams::default(), BTreeSet::new());
    c.bench_function("log_likelihood", |b| {
        b.iter(|| black_box(solver.log_likelihood()))
    });
}

fn bench_solver_short_fit(c: &mut Criterion) {
    let matches = synthetic_archive(20, &["2324", "2425"]);
    let mut params = SimParams::default();
    params.max_iterations = 10;
    c.bench_function("solver_ten_iterations", |b| {
        b.iter(|| {
            let fitted =
                MleSolver::new(black_box(&matches), params, BTreeSet::new()).optimize();
            black_box(fitted.log_likelihood);
        })
    });
}

fn bench_path_simulation(c: &mut Criterion) {
    let matches = synthetic_archive(20, &["2425"]);
    let fitted = MleSolver::new(&matches, SimParams::default(), BTreeSet::new()).optimize();

    let table: Vec<TeamEntry> = (0..20)
        .map(|i| TeamEntry {
            name: format!("Club {i:02}"),
            points: 30 - i as i32,
            goal_difference: 10 - i as i32,
            ..TeamEntry::default()
        })
        .collect();
    let fixtures: Vec<String> = (0..20)
        .flat_map(|i| {
            (0..20)
                .filter(move |&j| j != i)
                .map(move |j| format!("Club {i:02} vs Club {j:02}"))
        })
        .collect();

    c.bench_function("simulate_1000_paths", |b| {
        b.iter(|| {
            let mut sim = SimPoints::from_table(black_box(&table), 1000);
            sim.simulate_remaining(black_box(&fixtures), &fitted, 7);
            black_box(sim.expected_points().len());
        })
    });
}

fn bench_position_probabilities(c: &mut Criterion) {
    let table: Vec<TeamEntry> = (0..20)
        .map(|i| TeamEntry {
            name: format!("Club {i:02}"),
            points: 30 - i as i32,
            ..TeamEntry::default()
        })
        .collect();

    c.bench_function("position_probabilities_full_league", |b| {
        b.iter(|| {
            // Fresh matrix each pass so the memo never short-circuits the
            // sort-heavy path under measurement.
            let sim = SimPoints::from_table(black_box(&table), 2000);
            black_box(sim.position_probabilities(None).len());
        })
    });
}

fn bench_parse_payoff(c: &mut Criterion) {
    c.bench_function("parse_payoff", |b| {
        b.iter(|| black_box(parse_payoff(black_box("1|4x0.25|15x0")).unwrap().len()))
    });
}

criterion_group!(
    perf,
    bench_score_matrix,
    bench_log_likelihood,
    bench_solver_short_fit,
    bench_path_simulation,
    bench_position_probabilities,
    bench_parse_payoff
);
criterion_main!(perf);
