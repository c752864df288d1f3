mod logic;
mod scenario;
mod util;

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;
use limestone_game::{Difficulty, JsonFileScoreStore};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    GameTester, LogicTester, PlayabilityAggregate, PlayabilityRecord, ScenarioResult, SeedInfo,
    TesterStore, aggregate_playability, resolve_seed_inputs, run_playability_analysis,
    validate_playability_targets,
};
use scenario::{expand_scenarios, get_scenario, list_scenarios};
use util::{OutputTarget, split_csv};

#[derive(Debug, Parser)]
#[command(name = "limestone-tester", version)]
#[command(about = "Automated logic testing and playability analysis for Limestone GeoGuesser")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run: integers, share codes like MD-GRANT42, or `all`
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and playability cell
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Restrict playability analysis to one tier
    #[arg(long)]
    #[arg(value_parser = ["easy", "medium", "hard"])]
    difficulty: Option<String>,

    /// Skip the playability sweep
    #[arg(long)]
    no_playability: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Persist personal bests to this JSON file instead of memory
    #[arg(long)]
    best_score_file: Option<PathBuf>,

    /// Landmark JSON to load instead of the bundled Kingston set
    #[arg(long)]
    landmarks: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();
    let start_time = Instant::now();

    let store = args
        .best_score_file
        .as_ref()
        .map_or_else(TesterStore::default, |path| {
            TesterStore::File(JsonFileScoreStore::new(path))
        });
    let tester = GameTester::load(args.landmarks.as_deref(), store, args.verbose)?;
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let scenarios = expand_scenarios(&split_csv(&args.scenarios));

    let results = run_logic_scenarios(&args, &scenarios, &seed_infos, &tester)?;
    let (records, aggregates) = gather_playability(&args, &tester, &seed_infos)?;

    write_reports(
        &args,
        &results,
        records.as_deref(),
        aggregates.as_deref(),
        start_time,
    )?;

    if let (Some(aggregates), Some(records)) = (aggregates.as_ref(), records.as_ref()) {
        validate_playability_targets(aggregates, records)?;
    }

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut out = OutputTarget::new(args.output.clone())?;
    writeln!(out, "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(out, "  {key:25} - {description}")?;
    }
    out.flush()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🗺️  Limestone GeoGuesser Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[SeedInfo],
    tester: &GameTester,
) -> Result<Vec<ScenarioResult>> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(tester.clone());
    let mut results = Vec::new();
    for name in scenarios {
        let Some(scenario) = get_scenario(name) else {
            bail!("Unknown scenario: {name} (see --list-scenarios)");
        };
        results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
    }
    Ok(results)
}

type PlayabilitySummary = (
    Option<Vec<PlayabilityRecord>>,
    Option<Vec<PlayabilityAggregate>>,
);

fn gather_playability(
    args: &Args,
    tester: &GameTester,
    seeds: &[SeedInfo],
) -> Result<PlayabilitySummary> {
    let wanted = matches!(args.report.as_str(), "console" | "csv");
    if args.no_playability || !wanted {
        return Ok((None, None));
    }
    let mut records = run_playability_analysis(tester, seeds, args.iterations)?;
    if let Some(tier) = args.difficulty.as_deref().and_then(Difficulty::parse) {
        records.retain(|record| record.difficulty == tier);
    }
    let aggregates = aggregate_playability(&records);
    Ok((Some(records), Some(aggregates)))
}

fn write_reports(
    args: &Args,
    results: &[ScenarioResult],
    records: Option<&[PlayabilityRecord]>,
    aggregates: Option<&[PlayabilityAggregate]>,
    start_time: Instant,
) -> Result<()> {
    let mut out = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut out, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    out,
                    "# Limestone GeoGuesser Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut out, results)?;
            }
        }
        "csv" => logic::reports::generate_csv_report(&mut out, records.unwrap_or_default())?,
        _ => {
            if results.is_empty() && aggregates.is_none_or(<[_]>::is_empty) {
                writeln!(out, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut out,
                    results,
                    aggregates.unwrap_or_default(),
                    start_time.elapsed(),
                )?;
            }
            writeln!(out)?;
            writeln!(out, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    out.flush()?;
    Ok(())
}
