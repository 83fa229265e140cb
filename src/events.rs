use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::{Result, bail};

use crate::types::MatchResult;

/// Sorted unique teams, leagues and seasons observed in an archive.
#[derive(Debug, Clone, Default)]
pub struct GlobalEntities {
    pub teams: Vec<String>,
    pub leagues: Vec<String>,
    pub seasons: Vec<String>,
}

/// Latest season code under lexicographic order, which for 4-digit `YYNN`
/// codes is also the latest start year.
pub fn find_latest_season(matches: &[MatchResult]) -> Option<String> {
    matches.iter().map(|m| m.season.clone()).max()
}

pub fn group_by_league(matches: &[MatchResult]) -> HashMap<String, Vec<MatchResult>> {
    let mut by_league: HashMap<String, Vec<MatchResult>> = HashMap::new();
    for m in matches {
        by_league.entry(m.league.clone()).or_default().push(m.clone());
    }
    by_league
}

/// Teams appearing home or away in the given season of the given matches.
pub fn teams_in_season(matches: &[MatchResult], season: &str) -> BTreeSet<String> {
    let mut teams = BTreeSet::new();
    for m in matches {
        if m.season == season {
            teams.insert(m.home_team.clone());
            teams.insert(m.away_team.clone());
        }
    }
    teams
}

pub fn extract_global_entities(matches: &[MatchResult]) -> GlobalEntities {
    let mut teams = BTreeSet::new();
    let mut leagues = BTreeSet::new();
    let mut seasons = BTreeSet::new();
    for m in matches {
        teams.insert(m.home_team.clone());
        teams.insert(m.away_team.clone());
        leagues.insert(m.league.clone());
        seasons.insert(m.season.clone());
    }
    GlobalEntities {
        teams: teams.into_iter().collect(),
        leagues: leagues.into_iter().collect(),
        seasons: seasons.into_iter().collect(),
    }
}

/// Teams whose league code differs between any pair of consecutive observed
/// seasons. Adjacency is over the team's own season history, so a team absent
/// for a season is still compared across the gap.
pub fn detect_league_change_teams(matches: &[MatchResult]) -> BTreeSet<String> {
    let mut history: HashMap<String, BTreeMap<String, String>> = HashMap::new();
    for m in matches {
        history
            .entry(m.home_team.clone())
            .or_default()
            .insert(m.season.clone(), m.league.clone());
        history
            .entry(m.away_team.clone())
            .or_default()
            .insert(m.season.clone(), m.league.clone());
    }

    let mut changed = BTreeSet::new();
    for (team, seasons) in &history {
        let leagues: Vec<&String> = seasons.values().collect();
        if leagues.windows(2).any(|pair| pair[0] != pair[1]) {
            changed.insert(team.clone());
        }
    }
    changed
}

/// Season start year for a 4-digit `YYNN` code ("2425" -> 2024).
pub fn season_start_year(season: &str) -> Result<i32> {
    let bytes = season.as_bytes();
    if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii_digit) {
        bail!("malformed season code {season:?}: expected 4 ASCII digits");
    }
    let yy = (bytes[0] - b'0') as i32 * 10 + (bytes[1] - b'0') as i32;
    Ok(2000 + yy)
}
