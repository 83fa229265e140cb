use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::events::GlobalEntities;
use crate::types::MatchResult;

/// Minimum archive volume for a meaningful fit.
pub const MIN_MATCHES: usize = 100;
pub const MIN_TEAMS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error in {}: {}", self.field, self.message)
    }
}

/// All input problems found in one pass, reported together.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "no validation errors");
        }
        let joined = self
            .errors
            .iter()
            .map(ValidationError::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

impl std::error::Error for ValidationErrors {}

/// Archive volume and handicap checks that gate the solver.
pub fn validate_archive(
    matches: &[MatchResult],
    handicaps: &HashMap<String, i32>,
    entities: &GlobalEntities,
    errors: &mut ValidationErrors,
) {
    if matches.len() < MIN_MATCHES {
        errors.push(
            "historical_data",
            format!(
                "insufficient historical data: need at least {MIN_MATCHES} matches, got {}",
                matches.len()
            ),
        );
    }
    if entities.teams.len() < MIN_TEAMS {
        errors.push(
            "historical_data",
            format!(
                "insufficient teams: need at least {MIN_TEAMS} teams, got {}",
                entities.teams.len()
            ),
        );
    }

    let known: HashSet<&str> = entities.teams.iter().map(String::as_str).collect();
    for team in handicaps.keys() {
        if !known.contains(team.as_str()) {
            errors.push(
                format!("handicaps[{team}]"),
                format!("team {team:?} not found in event data"),
            );
        }
    }
}

/// Optional league-group configuration must only reference observed leagues
/// and teams.
pub fn validate_league_groups(
    league_groups: &HashMap<String, Vec<String>>,
    entities: &GlobalEntities,
    errors: &mut ValidationErrors,
) {
    let valid_leagues: HashSet<&str> = entities.leagues.iter().map(String::as_str).collect();
    let valid_teams: HashSet<&str> = entities.teams.iter().map(String::as_str).collect();

    for (league, teams) in league_groups {
        if !valid_leagues.contains(league.as_str()) {
            errors.push(
                format!("league_groups[{league}]"),
                format!(
                    "league {league:?} not found in event data (available: {:?})",
                    entities.leagues
                ),
            );
            continue;
        }
        for (idx, team) in teams.iter().enumerate() {
            if !valid_teams.contains(team.as_str()) {
                errors.push(
                    format!("league_groups[{league}][{idx}]"),
                    format!("team {team:?} not found in event data for league {league:?}"),
                );
            }
        }
    }
}
