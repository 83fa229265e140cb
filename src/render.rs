use crate::engine::ProjectionResult;
use crate::markets::Market;
use crate::types::TeamEntry;

/// Fixed-width console table of one league's projection.
pub fn render_league_table(league: &str, table: &[TeamEntry]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{league} projected table\n"));
    out.push_str(&format!(
        "{:>3} {:<22} {:>5} {:>5} {:>4} {:>8} {:>8} {:>7} {:>7} {:>9}\n",
        "Pos", "Team", "Pts", "GD", "Pld", "Attack", "Defense", "LamH", "LamA", "SeasonPts"
    ));
    for (idx, team) in table.iter().enumerate() {
        out.push_str(&format!(
            "{:>3} {:<22} {:>5} {:>5} {:>4} {:>8.3} {:>8.3} {:>7.2} {:>7.2} {:>9.1}\n",
            idx + 1,
            team.name,
            team.points,
            team.goal_difference,
            team.played,
            team.attack_rating,
            team.defense_rating,
            team.lambda_home,
            team.lambda_away,
            team.expected_season_points,
        ));
    }
    out
}

/// Mark values per market, one row per team in league-table order. Teams
/// outside a market's subset get a blank cell.
pub fn render_marks(
    league: &str,
    table: &[TeamEntry],
    markets: &[Market],
    marks: &std::collections::BTreeMap<String, std::collections::BTreeMap<String, f64>>,
) -> String {
    let league_markets: Vec<&Market> = markets.iter().filter(|m| m.league == league).collect();
    if league_markets.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("{league} market marks\n"));
    out.push_str(&format!("{:<22}", "Team"));
    for market in &league_markets {
        out.push_str(&format!(" {:>14}", truncate(&market.name, 14)));
    }
    out.push('\n');

    for team in table {
        out.push_str(&format!("{:<22}", team.name));
        for market in &league_markets {
            let cell = marks
                .get(&market.name)
                .and_then(|m| m.get(&team.name))
                .map(|value| format!("{value:.4}"))
                .unwrap_or_default();
            out.push_str(&format!(" {cell:>14}"));
        }
        out.push('\n');
    }
    out
}

/// Closing summary: rating spreads, fit diagnostics and timing.
pub fn render_summary(result: &ProjectionResult) -> String {
    let params = &result.mle_params;
    let spread = |values: &std::collections::BTreeMap<String, f64>| {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &v in values.values() {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let mean = if values.is_empty() { 0.0 } else { sum / values.len() as f64 };
        (mean, min, max)
    };
    let (attack_mean, attack_min, attack_max) = spread(&params.attack_ratings);
    let (defense_mean, defense_min, defense_max) = spread(&params.defense_ratings);

    let mut out = String::new();
    out.push_str(&format!(
        "Fit: {} iterations, converged={}, log-likelihood {:.2}\n",
        params.iterations, params.converged, params.log_likelihood
    ));
    out.push_str(&format!(
        "Attack ratings  - mean {attack_mean:6.3}, range [{attack_min:6.3}, {attack_max:6.3}]\n"
    ));
    out.push_str(&format!(
        "Defense ratings - mean {defense_mean:6.3}, range [{defense_min:6.3}, {defense_max:6.3}]\n"
    ));
    out.push_str(&format!(
        "Processed {} matches across {} leagues in {:?}\n",
        result.total_matches,
        result.leagues.len(),
        result.processing_time
    ));
    out
}

fn truncate(name: &str, width: usize) -> &str {
    match name.char_indices().nth(width) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_every_team_in_order() {
        let table = vec![
            TeamEntry {
                name: "Leaders".to_string(),
                points: 40,
                expected_season_points: 88.5,
                ..TeamEntry::default()
            },
            TeamEntry {
                name: "Chasers".to_string(),
                points: 38,
                expected_season_points: 80.1,
                ..TeamEntry::default()
            },
        ];
        let rendered = render_league_table("ENG1", &table);
        let leaders_line = rendered.lines().position(|l| l.contains("Leaders")).unwrap();
        let chasers_line = rendered.lines().position(|l| l.contains("Chasers")).unwrap();
        assert!(leaders_line < chasers_line);
        assert!(rendered.contains("88.5"));
    }

    #[test]
    fn marks_leave_blank_cells_for_outsiders() {
        use std::collections::BTreeMap;

        let table = vec![
            TeamEntry {
                name: "In".to_string(),
                ..TeamEntry::default()
            },
            TeamEntry {
                name: "Out".to_string(),
                ..TeamEntry::default()
            },
        ];
        let markets = vec![Market {
            name: "Winner".to_string(),
            league: "ENG1".to_string(),
            payoff: "1".to_string(),
            include: vec!["In".to_string()],
            exclude: vec![],
            teams: vec!["In".to_string()],
            parsed_payoff: vec![1.0],
        }];
        let mut winner = BTreeMap::new();
        winner.insert("In".to_string(), 1.0);
        let mut marks = BTreeMap::new();
        marks.insert("Winner".to_string(), winner);

        let rendered = render_marks("ENG1", &table, &markets, &marks);
        let out_line = rendered.lines().find(|l| l.starts_with("Out")).unwrap();
        assert!(!out_line.contains("1.0000"));
        let in_line = rendered.lines().find(|l| l.starts_with("In")).unwrap();
        assert!(in_line.contains("1.0000"));
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("short", 14), "short");
        assert_eq!(truncate("a very long market name", 6), "a very");
    }
}
