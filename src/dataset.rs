use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::http_client::http_client;
use crate::markets::Market;
use crate::types::MatchResult;

const FOOTBALL_DATA_BASE: &str = "https://www.football-data.co.uk/mmz4281";
const FETCH_MAX_RETRIES: u32 = 3;
/// Politeness delay between archive requests.
const FETCH_DELAY: Duration = Duration::from_secs(1);

/// One league's slice of the football-data.co.uk archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaguePlan {
    /// Our league code, e.g. `ENG1`.
    pub code: String,
    /// football-data.co.uk file id, e.g. `E0`.
    pub football_data_id: String,
    /// First season start year, e.g. 2015 for 2015-16.
    pub start_year: i32,
    /// Last season start year, e.g. 2024 for 2024-25.
    pub end_year: i32,
}

/// Ten seasons of the four English divisions.
pub fn default_league_plan() -> Vec<LeaguePlan> {
    [("ENG1", "E0"), ("ENG2", "E1"), ("ENG3", "E2"), ("ENG4", "E3")]
        .into_iter()
        .map(|(code, id)| LeaguePlan {
            code: code.to_string(),
            football_data_id: id.to_string(),
            start_year: 2015,
            end_year: 2024,
        })
        .collect()
}

/// Season code for a start year: 2024 -> "2425".
pub fn season_code(start_year: i32) -> String {
    format!("{:02}{:02}", start_year % 100, (start_year + 1) % 100)
}

/// Downloads and parses every season of every league in the plan. A season
/// that fails after retries is logged and skipped rather than aborting the
/// whole fetch.
pub fn fetch_archive(plan: &[LeaguePlan]) -> Result<Vec<MatchResult>> {
    let mut all_matches = Vec::new();
    for league in plan {
        for year in league.start_year..=league.end_year {
            let season = season_code(year);
            match fetch_season(league, &season) {
                Ok(mut matches) => {
                    info!("{} season {season}: {} matches", league.code, matches.len());
                    all_matches.append(&mut matches);
                }
                Err(err) => {
                    warn!("{} season {season}: {err}", league.code);
                }
            }
        }
    }
    if all_matches.is_empty() {
        return Err(anyhow!("no matches fetched for any league in the plan"));
    }
    Ok(all_matches)
}

fn fetch_season(league: &LeaguePlan, season: &str) -> Result<Vec<MatchResult>> {
    let url = format!(
        "{FOOTBALL_DATA_BASE}/{season}/{}.csv",
        league.football_data_id
    );
    let client = http_client()?;

    let mut last_error = anyhow!("unreachable");
    for attempt in 0..FETCH_MAX_RETRIES {
        if attempt == 0 {
            thread::sleep(FETCH_DELAY);
        } else {
            // Exponential backoff: 2s, 4s.
            thread::sleep(Duration::from_secs(2u64 << (attempt - 1)));
        }

        match client.get(&url).send() {
            Ok(response) if response.status().is_success() => {
                let body = response.text().context("read csv body")?;
                return parse_results_csv(&body, &league.code, season);
            }
            Ok(response) => {
                last_error = anyhow!("HTTP {} from {url}", response.status());
            }
            Err(err) => {
                last_error = anyhow!(err).context(format!("request {url} failed"));
            }
        }
    }
    Err(last_error)
}

/// Parses the football-data.co.uk results CSV. Columns are located by header
/// name; rows with missing or unparseable fields are skipped.
pub fn parse_results_csv(body: &str, league_code: &str, season: &str) -> Result<Vec<MatchResult>> {
    let mut lines = body.lines();
    let header = lines.next().ok_or_else(|| anyhow!("empty CSV file"))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let find = |name: &str| {
        columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("column {name:?} not found in CSV header"))
    };
    let date_col = find("Date")?;
    let home_col = find("HomeTeam")?;
    let away_col = find("AwayTeam")?;
    // Full-time home/away goals.
    let home_goals_col = find("FTHG")?;
    let away_goals_col = find("FTAG")?;

    let mut matches = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let max_col = [date_col, home_col, away_col, home_goals_col, away_goals_col]
            .into_iter()
            .max()
            .unwrap_or(0);
        if fields.len() <= max_col {
            continue;
        }

        let Some(date) = parse_result_date(fields[date_col]) else {
            continue;
        };
        let home_team = fields[home_col];
        let away_team = fields[away_col];
        if home_team.is_empty() || away_team.is_empty() {
            continue;
        }
        let (Ok(home_goals), Ok(away_goals)) = (
            fields[home_goals_col].parse::<u32>(),
            fields[away_goals_col].parse::<u32>(),
        ) else {
            continue;
        };

        matches.push(MatchResult {
            date: date.format("%Y-%m-%d").to_string(),
            season: season.to_string(),
            league: league_code.to_string(),
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_goals,
            away_goals,
        });
    }

    if matches.is_empty() {
        return Err(anyhow!("no valid rows parsed from CSV"));
    }
    Ok(matches)
}

/// football-data.co.uk has used both two- and four-digit years.
fn parse_result_date(raw: &str) -> Option<NaiveDate> {
    for format in ["%d/%m/%y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    None
}

pub fn load_matches(path: &Path) -> Result<Vec<MatchResult>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read events file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("decode events json {}", path.display()))
}

pub fn save_matches(matches: &[MatchResult], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let json = serde_json::to_string_pretty(matches).context("serialize events")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write events file {}", tmp.display()))?;
    fs::rename(&tmp, path).context("swap events file")?;
    Ok(())
}

pub fn load_markets(path: &Path) -> Result<Vec<Market>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read markets file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("decode markets json {}", path.display()))
}

pub fn load_handicaps(path: &Path) -> Result<HashMap<String, i32>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read handicaps file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("decode handicaps json {}", path.display()))
}

/// Team entry of a league-group config file. `alt_names` is accepted for
/// forward compatibility but unused: team names match exactly or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    #[serde(default, rename = "altNames", skip_serializing_if = "Vec::is_empty")]
    pub alt_names: Vec<String>,
}

/// Loads `<dir>/<league>-teams.json` for every league that has one. Missing
/// files are fine; unreadable or malformed files are not.
pub fn load_league_groups(dir: &Path, leagues: &[String]) -> Result<HashMap<String, Vec<String>>> {
    let mut groups = HashMap::new();
    for league in leagues {
        let path = dir.join(format!("{league}-teams.json"));
        if !path.exists() {
            continue;
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read teams file {}", path.display()))?;
        let teams: Vec<TeamConfig> = serde_json::from_str(&raw)
            .with_context(|| format!("decode teams json {}", path.display()))?;
        groups.insert(
            league.clone(),
            teams.into_iter().map(|t| t.name).collect(),
        );
    }
    Ok(groups)
}
