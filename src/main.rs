use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};

use outrights::dataset;
use outrights::engine::{ProjectionRequest, run_projection};
use outrights::render;
use outrights::types::SimParams;

const USAGE: &str = "\
outrights - Dixon-Coles ratings and outright projections

Usage:
  outrights fetch [--events PATH]
  outrights run   [--events PATH] [--markets PATH] [--handicaps PATH]
                  [--team-lists DIR] [--paths N] [--maxiter N]
                  [--tolerance X] [--seed N] [--verbose]

fetch downloads ten seasons of English league results from
football-data.co.uk into an events JSON file (default fixtures/events.json).
run fits the model over an events file and prints projected tables,
market marks and a fit summary.
";

struct Args {
    command: String,
    events: PathBuf,
    markets: Option<PathBuf>,
    handicaps: Option<PathBuf>,
    team_lists: Option<PathBuf>,
    params: SimParams,
    verbose: bool,
}

fn parse_args() -> Result<Args> {
    let mut argv = std::env::args().skip(1);
    let command = argv.next().ok_or_else(|| anyhow!("missing command"))?;

    let mut args = Args {
        command,
        events: PathBuf::from("fixtures/events.json"),
        markets: None,
        handicaps: None,
        team_lists: None,
        params: SimParams::default(),
        verbose: false,
    };

    while let Some(flag) = argv.next() {
        let mut value = |name: &str| {
            argv.next()
                .ok_or_else(|| anyhow!("flag {name} needs a value"))
        };
        match flag.as_str() {
            "--events" => args.events = PathBuf::from(value("--events")?),
            "--markets" => args.markets = Some(PathBuf::from(value("--markets")?)),
            "--handicaps" => args.handicaps = Some(PathBuf::from(value("--handicaps")?)),
            "--team-lists" => args.team_lists = Some(PathBuf::from(value("--team-lists")?)),
            "--paths" => {
                args.params.simulation_paths =
                    value("--paths")?.parse().context("--paths must be an integer")?;
            }
            "--maxiter" => {
                args.params.max_iterations =
                    value("--maxiter")?.parse().context("--maxiter must be an integer")?;
            }
            "--tolerance" => {
                args.params.tolerance =
                    value("--tolerance")?.parse().context("--tolerance must be a number")?;
            }
            "--seed" => {
                args.params.seed =
                    Some(value("--seed")?.parse().context("--seed must be an integer")?);
            }
            "--verbose" => args.verbose = true,
            other => bail!("unknown flag {other:?}"),
        }
    }
    Ok(args)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let outcome = match args.command.as_str() {
        "fetch" => cmd_fetch(&args),
        "run" => cmd_run(&args),
        other => {
            eprintln!("unknown command {other:?}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_fetch(args: &Args) -> Result<()> {
    let plan = dataset::default_league_plan();
    println!(
        "Fetching {} leagues from football-data.co.uk (this takes a while; \
         one polite request per league-season)...",
        plan.len()
    );
    let matches = dataset::fetch_archive(&plan)?;
    dataset::save_matches(&matches, &args.events)?;
    println!("Saved {} matches to {}", matches.len(), args.events.display());
    Ok(())
}

fn cmd_run(args: &Args) -> Result<()> {
    let matches = dataset::load_matches(&args.events)?;
    println!("Loaded {} matches from {}", matches.len(), args.events.display());

    let markets = match &args.markets {
        Some(path) => {
            let markets = dataset::load_markets(path)?;
            println!("Loaded {} markets from {}", markets.len(), path.display());
            markets
        }
        None => Vec::new(),
    };
    let handicaps = match &args.handicaps {
        Some(path) => dataset::load_handicaps(path)?,
        None => HashMap::new(),
    };
    let league_groups = match &args.team_lists {
        Some(dir) => {
            let leagues: Vec<String> = {
                let entities = outrights::events::extract_global_entities(&matches);
                entities.leagues
            };
            dataset::load_league_groups(dir, &leagues)?
        }
        None => HashMap::new(),
    };

    let result = run_projection(ProjectionRequest {
        matches,
        markets,
        league_groups,
        handicaps,
        params: args.params,
    })?;

    for (league, projection) in &result.leagues {
        println!();
        print!("{}", render::render_league_table(league, &projection.table));
        let marks = render::render_marks(league, &projection.table, &result.markets, &projection.marks);
        if !marks.is_empty() {
            println!();
            print!("{marks}");
        }
    }

    println!();
    print!("{}", render::render_summary(&result));

    if args.verbose {
        println!();
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}
