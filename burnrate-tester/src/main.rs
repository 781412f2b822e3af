mod assets;
mod logic;
mod storage;
mod util;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use assets::TesterAssets;
use logic::{
    GameplayStrategy, PlaythroughRunner, SimulationSummary, StrategyAggregate, aggregate_runs,
    resolve_seed_inputs,
};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "burnrate-tester", version = "0.1.0")]
#[command(about = "Automated playthroughs and invariant checks for the Burnrate engine")]
struct Args {
    /// Strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "balanced")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated integers or ranges like `1..10`, `1..=10`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per strategy and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Turn budget per playthrough
    #[arg(long, default_value_t = 500)]
    max_turns: u32,

    /// Archetype for every run; rotates through the catalog when omitted
    #[arg(long)]
    archetype: Option<String>,

    /// Background the session every N turns (0 disables the offline cycle)
    #[arg(long, default_value_t = 24)]
    background_every: u32,

    /// Simulated minutes spent in the background per offline cycle
    #[arg(long, default_value_t = 120)]
    offline_minutes: i64,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Persist each run's session under this directory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Engine config JSON overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding actions.json, events.json and archetypes.json
    #[arg(long)]
    catalog_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let strategies = expand_strategies(&args.strategies)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let assets = TesterAssets::embedded()
        .with_catalog_dir(args.catalog_dir.clone())
        .with_config_path(args.config.clone());
    let runner = PlaythroughRunner::new(assets, args.archetype.clone(), args.verbose)?
        .with_max_turns(args.max_turns)
        .with_offline_cycle(args.background_every, args.offline_minutes.saturating_mul(60))
        .with_save_dir(args.save_dir.clone());

    println!(
        "{} {} strategies × {} seeds × {} iterations",
        "🧪 Running".bright_yellow().bold(),
        strategies.len(),
        seeds.len(),
        args.iterations
    );
    let runs = runner.run(&strategies, &seeds, args.iterations)?;
    let aggregates = aggregate_runs(&runs);

    write_reports(&args, &runs, &aggregates, start_time)?;

    if runs.iter().any(|run| !run.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🔥 Burnrate Automated Tester".bright_cyan().bold());
    println!("{}", "============================".cyan());
}

fn expand_strategies(raw: &str) -> Result<Vec<GameplayStrategy>> {
    let mut strategies = Vec::new();
    for token in split_csv(raw) {
        if token.eq_ignore_ascii_case("all") {
            for strategy in GameplayStrategy::ALL {
                if !strategies.contains(&strategy) {
                    strategies.push(strategy);
                }
            }
            continue;
        }
        let strategy: GameplayStrategy = match token.parse() {
            Ok(strategy) => strategy,
            Err(err) => bail!("{err} (try --list-strategies)"),
        };
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    if strategies.is_empty() {
        bail!("no strategies selected");
    }
    Ok(strategies)
}

fn write_reports(
    args: &Args,
    runs: &[SimulationSummary],
    aggregates: &[StrategyAggregate],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, runs, aggregates)?,
        "markdown" => {
            if runs.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Burnrate Playthrough Results\n\n_No runs executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, runs, aggregates)?;
            }
        }
        "csv" => logic::reports::generate_csv_report(&mut output_target, runs)?,
        _ => {
            if runs.is_empty() {
                writeln!(&mut output_target, "No runs executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    runs,
                    aggregates,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    if matches!(args.report.as_str(), "console" | "markdown") {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnrate_game::Ending;
    use crate::logic::aggregate::tests::sample_run;

    fn base_args() -> Args {
        Args {
            strategies: "balanced".to_string(),
            list_strategies: false,
            seeds: "1337".to_string(),
            iterations: 1,
            max_turns: 50,
            archetype: None,
            background_every: 24,
            offline_minutes: 120,
            report: "json".to_string(),
            output: None,
            save_dir: None,
            config: None,
            catalog_dir: None,
            verbose: false,
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("burnrate-{}-{name}", std::process::id()))
    }

    fn sample_runs() -> Vec<SimulationSummary> {
        vec![
            sample_run(GameplayStrategy::Grinder, 1, Some(Ending::Victory), 90, 75_000),
            sample_run(GameplayStrategy::Cautious, 2, None, 50, 3_000),
        ]
    }

    #[test]
    fn expands_all_strategies_keyword() {
        let expanded = expand_strategies("cautious,all").unwrap();
        assert_eq!(
            expanded,
            vec![
                GameplayStrategy::Cautious,
                GameplayStrategy::Grinder,
                GameplayStrategy::Balanced,
                GameplayStrategy::Random,
            ]
        );
    }

    #[test]
    fn expand_strategies_preserves_order_and_rejects_unknown() {
        let expanded = expand_strategies("random, grinder ,random").unwrap();
        assert_eq!(
            expanded,
            vec![GameplayStrategy::Random, GameplayStrategy::Grinder]
        );
        assert!(expand_strategies("yolo").is_err());
        assert!(expand_strategies(" , ").is_err());
    }

    #[test]
    fn maybe_list_strategies_writes_output() {
        let temp = temp_file("strategies.txt");
        let args = Args {
            list_strategies: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_strategies(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available strategies"));
        assert!(content.contains("grinder"));
    }

    #[test]
    fn maybe_list_strategies_returns_false_when_disabled() {
        let args = base_args();
        assert!(!maybe_list_strategies(&args).unwrap());
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = temp_file("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        let runs = sample_runs();
        write_reports(&args, &runs, &aggregate_runs(&runs), Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["runs"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_file("report-empty.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No runs executed"));
    }

    #[test]
    fn write_reports_emits_csv_report() {
        let temp = temp_file("report.csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        let runs = sample_runs();
        write_reports(&args, &runs, &aggregate_runs(&runs), Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.starts_with("strategy,seed"));
        assert!(content.contains("grinder,1,hacker"));
        assert!(!content.contains("Total time"));
    }

    #[test]
    fn write_reports_emits_console_report() {
        let temp = temp_file("report-console.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        let runs = sample_runs();
        write_reports(&args, &runs, &aggregate_runs(&runs), Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Playthrough Summary"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
