use std::collections::HashMap;

use crate::types::{Event, MatchResult, TeamEntry};

/// Number of times each ordered (home, away) pair meets per season. Scottish
/// league codes run a double round-robin.
pub fn rounds_for_league(league: &str) -> u32 {
    if league.starts_with("SCO") { 2 } else { 1 }
}

/// Splits a `"Home vs Away"` event name back into team names.
pub fn parse_event_name(name: &str) -> Option<(&str, &str)> {
    let (home, away) = name.split_once(" vs ")?;
    if home.is_empty() || away.is_empty() {
        return None;
    }
    Some((home, away))
}

/// Reshapes played matches of one season into the event form used for fixture
/// bookkeeping. Pass an empty season to keep every match.
pub fn matches_to_events(matches: &[MatchResult], season: &str) -> Vec<Event> {
    matches
        .iter()
        .filter(|m| season.is_empty() || m.season == season)
        .map(|m| Event {
            name: format!("{} vs {}", m.home_team, m.away_team),
            date: m.date.clone(),
            score: Some((m.home_goals, m.away_goals)),
        })
        .collect()
}

/// Builds the current league table for the authoritative team list, accreting
/// any team that appears in an event but is missing from the list. Handicaps
/// are added once to the team's starting points. Rows sort by (points desc,
/// goal difference desc); further ties keep no particular order.
pub fn league_table(
    team_names: &[String],
    events: &[Event],
    handicaps: &HashMap<String, i32>,
) -> Vec<TeamEntry> {
    let mut rows: Vec<TeamEntry> = Vec::with_capacity(team_names.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(team_names.len());
    for name in team_names {
        index.insert(name.clone(), rows.len());
        rows.push(TeamEntry {
            name: name.clone(),
            ..TeamEntry::default()
        });
    }

    for event in events {
        let Some((home, away)) = parse_event_name(&event.name) else {
            continue;
        };
        let Some((home_goals, away_goals)) = event.score else {
            continue;
        };

        for team in [home, away] {
            if !index.contains_key(team) {
                index.insert(team.to_string(), rows.len());
                rows.push(TeamEntry {
                    name: team.to_string(),
                    ..TeamEntry::default()
                });
            }
        }
        let home_idx = index[home];
        let away_idx = index[away];

        if home_goals > away_goals {
            rows[home_idx].points += 3;
        } else if home_goals < away_goals {
            rows[away_idx].points += 3;
        } else {
            rows[home_idx].points += 1;
            rows[away_idx].points += 1;
        }
        rows[home_idx].goal_difference += home_goals as i32 - away_goals as i32;
        rows[away_idx].goal_difference += away_goals as i32 - home_goals as i32;
        rows[home_idx].played += 1;
        rows[away_idx].played += 1;
    }

    for (team, &adjustment) in handicaps {
        if let Some(&idx) = index.get(team) {
            rows[idx].points += adjustment;
        }
    }

    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_difference.cmp(&a.goal_difference))
    });
    rows
}

/// Every ordered pair of distinct authoritative teams is expected `rounds`
/// times per season; whatever has not been played yet is returned as
/// `"Home vs Away"` strings, with multiplicity.
pub fn remaining_fixtures(team_names: &[String], events: &[Event], rounds: u32) -> Vec<String> {
    let mut played_counts: HashMap<&str, u32> = HashMap::new();
    for event in events {
        if event.score.is_some() {
            *played_counts.entry(event.name.as_str()).or_default() += 1;
        }
    }

    let mut remaining = Vec::new();
    for (i, home) in team_names.iter().enumerate() {
        for (j, away) in team_names.iter().enumerate() {
            if i == j {
                continue;
            }
            let fixture = format!("{home} vs {away}");
            let played = played_counts.get(fixture.as_str()).copied().unwrap_or(0);
            for _ in played..rounds {
                remaining.push(fixture.clone());
            }
        }
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn played(home: &str, away: &str, score: (u32, u32)) -> Event {
        Event {
            name: format!("{home} vs {away}"),
            date: "2024-09-01".to_string(),
            score: Some(score),
        }
    }

    #[test]
    fn rounds_by_league_prefix() {
        assert_eq!(rounds_for_league("SCO1"), 2);
        assert_eq!(rounds_for_league("SCO3"), 2);
        assert_eq!(rounds_for_league("ENG1"), 1);
        assert_eq!(rounds_for_league("GER1"), 1);
    }

    #[test]
    fn event_name_round_trip() {
        assert_eq!(parse_event_name("Hearts vs Celtic"), Some(("Hearts", "Celtic")));
        assert_eq!(parse_event_name("no separator"), None);
        assert_eq!(parse_event_name(" vs Celtic"), None);
    }

    #[test]
    fn table_points_and_goal_difference() {
        let teams = names(&["A", "B", "C"]);
        let events = vec![
            played("A", "B", (2, 0)),
            played("B", "C", (1, 1)),
            played("C", "A", (0, 3)),
        ];
        let table = league_table(&teams, &events, &HashMap::new());

        assert_eq!(table[0].name, "A");
        assert_eq!(table[0].points, 6);
        assert_eq!(table[0].goal_difference, 5);
        assert_eq!(table[0].played, 2);

        let b = table.iter().find(|t| t.name == "B").unwrap();
        assert_eq!(b.points, 1);
        assert_eq!(b.goal_difference, -2);
    }

    #[test]
    fn table_accretes_unlisted_teams() {
        let teams = names(&["A"]);
        let events = vec![played("A", "Stranger", (0, 1))];
        let table = league_table(&teams, &events, &HashMap::new());
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].name, "Stranger");
        assert_eq!(table[0].points, 3);
    }

    #[test]
    fn handicap_added_once_to_starting_points() {
        let teams = names(&["A", "B"]);
        let events = vec![played("A", "B", (1, 0))];
        let mut handicaps = HashMap::new();
        handicaps.insert("A".to_string(), -10);
        let table = league_table(&teams, &events, &handicaps);

        let a = table.iter().find(|t| t.name == "A").unwrap();
        assert_eq!(a.points, -7);
        // Handicap never touches played counts or goal difference.
        assert_eq!(a.played, 1);
        assert_eq!(a.goal_difference, 1);
    }

    #[test]
    fn goal_difference_breaks_point_ties() {
        let teams = names(&["A", "B", "C", "D"]);
        let events = vec![played("A", "C", (1, 0)), played("B", "D", (4, 0))];
        let table = league_table(&teams, &events, &HashMap::new());
        assert_eq!(table[0].name, "B");
        assert_eq!(table[1].name, "A");
    }

    #[test]
    fn full_single_round_robin_counts() {
        let teams: Vec<String> = (0..20).map(|i| format!("T{i:02}")).collect();
        let remaining = remaining_fixtures(&teams, &[], 1);
        assert_eq!(remaining.len(), 20 * 19);
    }

    #[test]
    fn scottish_double_round_robin_counts() {
        let teams: Vec<String> = (0..12).map(|i| format!("T{i:02}")).collect();
        let rounds = rounds_for_league("SCO1");
        let remaining = remaining_fixtures(&teams, &[], rounds);
        assert_eq!(remaining.len(), 12 * 11 * 2);
    }

    #[test]
    fn played_fixtures_reduce_the_remainder() {
        let teams = names(&["A", "B", "C"]);
        let events = vec![played("A", "B", (2, 2))];
        let remaining = remaining_fixtures(&teams, &events, 1);
        assert_eq!(remaining.len(), 5);
        assert!(!remaining.contains(&"A vs B".to_string()));
        assert!(remaining.contains(&"B vs A".to_string()));

        // A double round-robin still owes one more A vs B.
        let remaining_two = remaining_fixtures(&teams, &events, 2);
        assert_eq!(
            remaining_two.iter().filter(|f| f.as_str() == "A vs B").count(),
            1
        );
    }
}
