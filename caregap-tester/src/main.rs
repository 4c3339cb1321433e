mod common;
mod logic;

use anyhow::{Context, Result, anyhow};
use caregap_game::{PolicyLever, PolicyLevers, SimVariant};
use clap::Parser;
use colored::Colorize;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::scenario::{TestScenario, get_scenario, list_scenarios};
use common::split_csv;
use logic::{
    GameTester, GameplayStrategy, LogicTester, SeedInfo, TesterAssets, resolve_seed_inputs,
    run_live,
};

#[derive(Debug, Parser)]
#[command(name = "caregap-tester", version)]
#[command(about = "Headless scenario runner and live player for the Care Gap simulations")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run: integers, `?seed=N` links, share codes, or `all`
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON tuning file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Policy levers switched on for every scenario (comma-separated)
    #[arg(long)]
    levers: Option<String>,

    /// Override the strategy of every scenario (baseline, advocate)
    #[arg(long)]
    strategy: Option<String>,

    /// Play one run in real time instead of running scenarios
    #[arg(long)]
    live: bool,

    /// Variant to play in live mode (journey, board, dash)
    #[arg(long, default_value = "journey")]
    variant: String,

    /// Milliseconds per live frame
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,

    /// Stop a live run after this many frames
    #[arg(long, default_value_t = 10_000)]
    max_frames: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let tester_assets = Arc::new(load_assets(&args)?);
    let game_tester = GameTester::new(tester_assets, args.verbose);

    if args.live {
        return play_live(&args, &game_tester, &seed_infos).await;
    }

    let scenarios = build_scenarios(&args)?;
    let all_results = run_logic_scenarios(&args, &scenarios, &seed_infos, &game_tester);

    write_reports(&args, &all_results, start_time)?;

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🩺 Care Gap Tester".bright_cyan().bold());
    println!("{}", "==================".cyan());
}

fn load_assets(args: &Args) -> Result<TesterAssets> {
    match &args.config {
        Some(path) => {
            info!("loading tuning from {}", path.display());
            TesterAssets::from_config_file(path)
        }
        None => Ok(TesterAssets::load_default()),
    }
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn parse_levers(raw: &str) -> Result<PolicyLevers> {
    let mut levers = PolicyLevers::default();
    for token in split_csv(raw) {
        if token.eq_ignore_ascii_case("all") {
            return Ok(PolicyLevers::all_on());
        }
        let lever: PolicyLever = token.parse().map_err(|e: String| anyhow!(e))?;
        levers.set(lever, true);
    }
    Ok(levers)
}

fn parse_strategy(raw: &str) -> Result<GameplayStrategy> {
    raw.parse().map_err(|e: String| {
        let known = GameplayStrategy::ALL.map(GameplayStrategy::label).join(", ");
        anyhow!("{e} (expected one of: {known})")
    })
}

/// Resolve scenario names and apply the CLI-wide overrides.
fn build_scenarios(args: &Args) -> Result<Vec<TestScenario>> {
    let strategy = args.strategy.as_deref().map(parse_strategy).transpose()?;
    let levers = args.levers.as_deref().map(parse_levers).transpose()?;

    let mut scenarios = Vec::new();
    for name in expand_scenarios(&args.scenarios) {
        let Some(mut scenario) = get_scenario(&name) else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
            continue;
        };
        if let Some(strategy) = strategy {
            scenario = scenario.with_strategy(strategy);
        }
        if let Some(levers) = levers {
            for lever in PolicyLever::ALL {
                if levers.is_active(lever) {
                    scenario.plan.levers.set(lever, true);
                }
            }
        }
        scenarios.push(scenario);
    }
    Ok(scenarios)
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[TestScenario],
    seed_infos: &[SeedInfo],
    game_tester: &GameTester,
) -> Vec<logic::ScenarioResult> {
    println!("{}", "🧠 Running Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(game_tester.clone());
    let mut results = Vec::new();

    for scenario in scenarios {
        let seeds: Vec<SeedInfo> = seed_infos
            .iter()
            .filter(|seed| seed.matches_variant(scenario.plan.variant))
            .cloned()
            .collect();
        if seeds.is_empty() {
            eprintln!(
                "⚠️  No seeds for {} match variant {}",
                scenario.name.yellow(),
                scenario.plan.variant
            );
            continue;
        }
        results.extend(logic_tester.run_scenario(scenario, &seeds, args.iterations));
    }

    results
}

async fn play_live(args: &Args, game_tester: &GameTester, seed_infos: &[SeedInfo]) -> Result<()> {
    let seed = seed_infos
        .first()
        .context("live mode needs at least one seed")?;
    let variant = match (seed.source_variant, args.variant.parse::<SimVariant>()) {
        (Some(from_code), _) => from_code,
        (None, parsed) => parsed.map_err(|e| anyhow!(e))?,
    };
    let strategy = args
        .strategy
        .as_deref()
        .map_or(Ok(GameplayStrategy::Advocate), parse_strategy)?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    let report = run_live(
        game_tester,
        variant,
        strategy,
        seed.seed,
        Duration::from_millis(args.tick_ms),
        args.max_frames,
        &mut output_target,
    )
    .await?;

    writeln!(&mut output_target)?;
    writeln!(&mut output_target, "{}", report.export)?;
    writeln!(
        &mut output_target,
        "Share code: {}",
        seed.share_code_for(variant)
    )?;
    output_target.flush_inner()?;
    Ok(())
}

fn write_reports(args: &Args, results: &[logic::ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Care Gap Scenario Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => logic::reports::generate_csv_report(&mut output_target, results)?,
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
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
    use crate::logic::{RunRecord, ScenarioResult};

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
            config: None,
            levers: None,
            strategy: None,
            live: false,
            variant: "journey".to_string(),
            tick_ms: 1,
            max_frames: 10_000,
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("caregap-{}-{name}", std::process::id()))
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke".to_string(),
            passed,
            iterations_run: 1,
            successful_iterations: usize::from(passed),
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
            runs: vec![RunRecord {
                scenario_name: "Smoke".to_string(),
                variant: "journey".to_string(),
                strategy: "Baseline".to_string(),
                seed_code: "TP-CLINIC42".to_string(),
                seed_value: 42,
                finished: true,
                actions: 18,
                interventions: 0,
                delay_total: 20,
                equity_gap: Some(4),
                winner: None,
                score: None,
                ending: "Treatment started (gap 4 days)".to_string(),
            }],
        }
    }

    #[test]
    fn expands_all_scenarios_keyword_without_duplicates() {
        let expanded = expand_scenarios("smoke,all");
        assert_eq!(expanded[0], "smoke");
        assert_eq!(expanded.len(), list_scenarios().len());
        assert!(expanded.contains(&"dash-idle".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("board-race,smoke");
        assert_eq!(expanded, vec!["board-race".to_string(), "smoke".to_string()]);
    }

    #[test]
    fn levers_parse_from_short_names() {
        let levers = parse_levers("transit, cap").unwrap();
        assert!(levers.is_active(PolicyLever::Transit));
        assert!(levers.is_active(PolicyLever::ClinicCapacity));
        assert!(!levers.is_active(PolicyLever::PaidLeave));
        assert_eq!(parse_levers("all").unwrap(), PolicyLevers::all_on());
        assert!(parse_levers("teleport").is_err());
    }

    #[test]
    fn unknown_strategy_lists_the_choices() {
        let err = parse_strategy("chaos").unwrap_err().to_string();
        assert!(err.contains("Baseline, Advocate"));
        assert_eq!(parse_strategy("pilot").unwrap(), GameplayStrategy::Advocate);
    }

    #[test]
    fn overrides_apply_to_every_scenario() {
        let args = Args {
            scenarios: "smoke,dash-idle,bogus".to_string(),
            strategy: Some("advocate".to_string()),
            levers: Some("leave".to_string()),
            ..base_args()
        };
        let scenarios = build_scenarios(&args).unwrap();
        assert_eq!(scenarios.len(), 2);
        for scenario in &scenarios {
            assert_eq!(scenario.plan.strategy, GameplayStrategy::Advocate);
            assert!(scenario.plan.levers.is_active(PolicyLever::PaidLeave));
        }
    }

    #[test]
    fn share_code_seeds_only_run_their_variant() {
        let tester = GameTester::try_new(false);
        let args = base_args();
        let scenarios = build_scenarios(&Args {
            scenarios: "smoke,board-race".to_string(),
            ..base_args()
        })
        .unwrap();
        let seeds = resolve_seed_inputs(&["BD-RIDE07".to_string()]).unwrap();
        let results = run_logic_scenarios(&args, &scenarios, &seeds, &tester);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].scenario_name, "Board Race - Baseline");
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_file("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("snapshot-resume"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_emits_empty_json() {
        let temp = temp_file("empty.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_file("empty.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No scenarios executed"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn write_reports_emits_csv_rows() {
        let temp = temp_file("report.csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.starts_with("scenario,variant,strategy"));
        assert!(content.contains("TP-CLINIC42"));
    }

    #[test]
    fn write_reports_console_lists_failures() {
        let temp = temp_file("report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(false)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Smoke"));
        assert!(content.contains("failure"));
    }

    #[tokio::test]
    async fn live_mode_writes_the_export() {
        let temp = temp_file("live.txt");
        let args = Args {
            live: true,
            variant: "board".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        let tester = GameTester::try_new(false);
        let seeds = resolve_seed_inputs(&["5".to_string()]).unwrap();
        play_live(&args, &tester, &seeds).await.unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Care Gap Board Race"));
        assert!(content.contains("Share code: BD-"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
