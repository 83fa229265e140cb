use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::validation::ValidationErrors;

/// An outright betting market: a payoff per finishing position, scoped to one
/// league and optionally to a subset of its teams.
///
/// Lifecycle: declared (deserialized) -> validated and initialised
/// ([`init_markets`] resolves `teams` and `parsed_payoff`) -> evaluated (mark
/// values computed against simulated finishing positions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub name: String,
    pub league: String,
    /// Payoff expression such as `"1|4x0.25|15x0"`: pipe-separated tokens,
    /// each a bare value for one position or `N x V` for N consecutive
    /// positions.
    pub payoff: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    /// Resolved team list; position 0 of `parsed_payoff` pays the champion
    /// among exactly these teams.
    #[serde(skip)]
    pub teams: Vec<String>,
    #[serde(skip)]
    pub parsed_payoff: Vec<f64>,
}

/// Expands a payoff expression into one value per finishing position.
pub fn parse_payoff(expression: &str) -> Result<Vec<f64>> {
    let mut payoff = Vec::new();
    for token in expression.split('|') {
        match token.split_once('x') {
            None => {
                let value: f64 = token
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid payoff token {token:?}"))?;
                payoff.push(value);
            }
            Some((count, value)) => {
                let count: usize = count
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid payoff count in token {token:?}"))?;
                if count == 0 {
                    bail!("payoff token {token:?} repeats zero positions");
                }
                let value: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid payoff value in token {token:?}"))?;
                payoff.extend(std::iter::repeat(value).take(count));
            }
        }
    }
    Ok(payoff)
}

/// Re-emits a payoff vector in the canonical grouped form, folding runs of
/// equal values into `N x V` tokens.
pub fn format_payoff(payoff: &[f64]) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut run_start = 0;
    for i in 0..=payoff.len() {
        if i == payoff.len() || payoff[i] != payoff[run_start] {
            let count = i - run_start;
            let value = payoff[run_start];
            if count == 1 {
                tokens.push(format!("{value}"));
            } else {
                tokens.push(format!("{count}x{value}"));
            }
            run_start = i;
        }
    }
    tokens.join("|")
}

/// Validates every market against the per-league authoritative team lists and
/// resolves its team subset and payoff vector. All problems across all
/// markets are collected into one report.
pub fn init_markets(
    markets: &mut [Market],
    league_teams: &HashMap<String, Vec<String>>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for market in markets.iter_mut() {
        let field = format!("markets[{}]", market.name);

        if market.league.is_empty() {
            errors.push(field.clone(), "no league specified");
            continue;
        }
        let Some(team_names) = league_teams.get(&market.league) else {
            errors.push(field.clone(), format!("unknown league {:?}", market.league));
            continue;
        };
        if !market.include.is_empty() && !market.exclude.is_empty() {
            errors.push(field.clone(), "cannot have both include and exclude");
            continue;
        }

        let known: HashSet<&str> = team_names.iter().map(String::as_str).collect();
        let mut unknown = false;
        for team in market.include.iter().chain(&market.exclude) {
            if !known.contains(team.as_str()) {
                errors.push(
                    field.clone(),
                    format!("unknown team {team:?} in league {}", market.league),
                );
                unknown = true;
            }
        }
        if unknown {
            continue;
        }

        market.teams = if !market.include.is_empty() {
            market.include.clone()
        } else if !market.exclude.is_empty() {
            let excluded: HashSet<&str> = market.exclude.iter().map(String::as_str).collect();
            team_names
                .iter()
                .filter(|t| !excluded.contains(t.as_str()))
                .cloned()
                .collect()
        } else {
            team_names.clone()
        };

        if market.payoff.is_empty() {
            errors.push(field.clone(), "no payoff defined");
            continue;
        }
        match parse_payoff(&market.payoff) {
            Ok(parsed) => {
                if parsed.len() != market.teams.len() {
                    errors.push(
                        field.clone(),
                        format!(
                            "payoff length {} does not match team count {}",
                            parsed.len(),
                            market.teams.len()
                        ),
                    );
                    continue;
                }
                market.parsed_payoff = parsed;
            }
            Err(err) => {
                errors.push(field.clone(), format!("payoff parse failed: {err}"));
                continue;
            }
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn league_of(n: usize) -> HashMap<String, Vec<String>> {
        let mut map = HashMap::new();
        map.insert(
            "ENG1".to_string(),
            (0..n).map(|i| format!("Team {i:02}")).collect(),
        );
        map
    }

    #[test]
    fn payoff_grammar_expansion() {
        let payoff = parse_payoff("1|4x0.25|15x0").unwrap();
        assert_eq!(payoff.len(), 20);
        assert_eq!(payoff[0], 1.0);
        assert!(payoff[1..5].iter().all(|&v| v == 0.25));
        assert!(payoff[5..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn bare_tokens_and_signs() {
        assert_eq!(parse_payoff("1").unwrap(), vec![1.0]);
        assert_eq!(parse_payoff("2.5|-1|3x0.5").unwrap(), vec![2.5, -1.0, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn malformed_tokens_are_fatal() {
        assert!(parse_payoff("abc").is_err());
        assert!(parse_payoff("2x").is_err());
        assert!(parse_payoff("x3").is_err());
        assert!(parse_payoff("0x1").is_err());
        assert!(parse_payoff("").is_err());
    }

    #[test]
    fn format_round_trips() {
        for expression in ["1|4x0.25|15x0", "1", "3x2.5", "1|1|0.5"] {
            let parsed = parse_payoff(expression).unwrap();
            let formatted = format_payoff(&parsed);
            assert_eq!(parse_payoff(&formatted).unwrap(), parsed);
        }
        assert_eq!(format_payoff(&[1.0, 0.0, 0.0]), "1|2x0");
    }

    #[test]
    fn include_market_resolves_listed_teams_in_order() {
        let mut markets = vec![Market {
            name: "Top of three".to_string(),
            league: "ENG1".to_string(),
            payoff: "1|2x0".to_string(),
            include: vec!["Team 02".to_string(), "Team 00".to_string(), "Team 01".to_string()],
            exclude: vec![],
            teams: vec![],
            parsed_payoff: vec![],
        }];
        init_markets(&mut markets, &league_of(20)).unwrap();
        assert_eq!(markets[0].teams, vec!["Team 02", "Team 00", "Team 01"]);
        assert_eq!(markets[0].parsed_payoff, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn exclude_market_keeps_authoritative_order() {
        let mut markets = vec![Market {
            name: "Without the champion".to_string(),
            league: "ENG1".to_string(),
            payoff: "1|18x0".to_string(),
            include: vec![],
            exclude: vec!["Team 00".to_string()],
            teams: vec![],
            parsed_payoff: vec![],
        }];
        init_markets(&mut markets, &league_of(20)).unwrap();
        assert_eq!(markets[0].teams.len(), 19);
        assert_eq!(markets[0].teams[0], "Team 01");
    }

    #[test]
    fn market_validation_collects_all_problems() {
        let mut markets = vec![
            Market {
                name: "Bad league".to_string(),
                league: "FRA1".to_string(),
                payoff: "1".to_string(),
                include: vec![],
                exclude: vec![],
                teams: vec![],
                parsed_payoff: vec![],
            },
            Market {
                name: "Both lists".to_string(),
                league: "ENG1".to_string(),
                payoff: "1".to_string(),
                include: vec!["Team 00".to_string()],
                exclude: vec!["Team 01".to_string()],
                teams: vec![],
                parsed_payoff: vec![],
            },
            Market {
                name: "Wrong length".to_string(),
                league: "ENG1".to_string(),
                payoff: "1|2x0".to_string(),
                include: vec![],
                exclude: vec![],
                teams: vec![],
                parsed_payoff: vec![],
            },
            Market {
                name: "Stranger".to_string(),
                league: "ENG1".to_string(),
                payoff: "1".to_string(),
                include: vec!["Atlantis".to_string()],
                exclude: vec![],
                teams: vec![],
                parsed_payoff: vec![],
            },
        ];
        let errors = init_markets(&mut markets, &league_of(20)).unwrap_err();
        assert_eq!(errors.errors.len(), 4);
    }
}
