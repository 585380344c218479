//! Library backing the `paso` binary: argument parsing, command dispatch,
//! and suite execution.

pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use paso::{Constants, Scenario, ScenarioFile};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced to the terminal
#[derive(Debug, Error)]
pub enum CliError {
    /// Core library error (config, scenario files, sequencing)
    #[error(transparent)]
    Paso(#[from] paso::PasoError),

    /// I/O error (also covers async runtime construction)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary was built without the `browser` feature
    #[error("this build has no browser support; rebuild with --features browser")]
    BrowserSupportDisabled,
}

/// Output format for suite reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON report
    Json,
}

/// Run declarative browser UI scenarios and report pass/fail
#[derive(Debug, Parser)]
#[command(name = "paso", version, about)]
pub struct Cli {
    /// Suppress per-scenario output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run scenarios against a real browser
    Run(RunArgs),
    /// List the scenarios that would run
    List(ListArgs),
    /// Validate scenario files without running them
    Check(CheckArgs),
}

/// Arguments for `paso run`
#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Only run scenarios whose name contains this substring
    #[arg(long)]
    pub filter: Option<String>,

    /// Constants JSON file (currencies, languages)
    #[arg(long)]
    pub constants: Option<PathBuf>,

    /// Additional scenario files (YAML) to run after the catalog
    #[arg(long = "scenario-file")]
    pub scenario_files: Vec<PathBuf>,

    /// Run the browser with a visible window
    #[arg(long)]
    pub headful: bool,

    /// Leave sessions open after each scenario for manual inspection
    #[arg(long)]
    pub keep_open: bool,

    /// Stop the suite at the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Bounded wait for element lookups, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub wait_ms: u64,

    /// Disable the chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Chromium executable path (auto-detected when omitted)
    #[arg(long)]
    pub chromium: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for `paso list`
#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Only list scenarios whose name contains this substring
    #[arg(long)]
    pub filter: Option<String>,

    /// Constants JSON file (currencies, languages)
    #[arg(long)]
    pub constants: Option<PathBuf>,

    /// Additional scenario files (YAML) to include
    #[arg(long = "scenario-file")]
    pub scenario_files: Vec<PathBuf>,
}

/// Arguments for `paso check`
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Scenario files to validate
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Parse arguments and dispatch. Returns whether everything passed; the
/// binary maps that to the process exit code (0 = all passed, 1 = any
/// failure).
pub fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Run(args) => cmd_run(&cli, args),
        Commands::List(args) => cmd_list(args),
        Commands::Check(args) => cmd_check(args),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("paso={default_level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Collect the catalog plus any scenario files, then apply the name filter
fn gather_scenarios(
    constants: Option<&PathBuf>,
    scenario_files: &[PathBuf],
    filter: Option<&str>,
) -> CliResult<Vec<Scenario>> {
    let constants = match constants {
        Some(path) => Constants::load(path)?,
        None => Constants::default(),
    };
    let mut scenarios = paso::scenarios::catalog(&constants);
    for path in scenario_files {
        let file = ScenarioFile::load(path)?;
        scenarios.extend(file.scenarios);
    }
    if let Some(filter) = filter {
        scenarios.retain(|s| s.name.contains(filter));
    }
    Ok(scenarios)
}

fn cmd_list(args: &ListArgs) -> CliResult<bool> {
    let scenarios = gather_scenarios(
        args.constants.as_ref(),
        &args.scenario_files,
        args.filter.as_deref(),
    )?;
    for scenario in &scenarios {
        if scenario.description.is_empty() {
            println!("{} ({} steps)", scenario.name, scenario.steps.len());
        } else {
            println!(
                "{} ({} steps) - {}",
                scenario.name,
                scenario.steps.len(),
                scenario.description
            );
        }
    }
    println!("{} scenario(s)", scenarios.len());
    Ok(true)
}

fn cmd_check(args: &CheckArgs) -> CliResult<bool> {
    let mut all_valid = true;
    for path in &args.files {
        match ScenarioFile::load(path) {
            Ok(file) => {
                println!("{}: ok ({} scenario(s))", path.display(), file.scenarios.len());
            }
            Err(err) => {
                println!("{}: {err}", path.display());
                all_valid = false;
            }
        }
    }
    Ok(all_valid)
}

fn cmd_run(cli: &Cli, args: &RunArgs) -> CliResult<bool> {
    let scenarios = gather_scenarios(
        args.constants.as_ref(),
        &args.scenario_files,
        args.filter.as_deref(),
    )?;
    if scenarios.is_empty() {
        println!("no scenarios selected");
        return Ok(true);
    }
    tracing::info!(count = scenarios.len(), "selected scenarios");
    run_suite(cli, args, scenarios)
}

#[cfg(feature = "browser")]
fn run_suite(cli: &Cli, args: &RunArgs, scenarios: Vec<Scenario>) -> CliResult<bool> {
    use crate::output::ProgressReporter;
    use paso::{
        BrowserConfig, CdpSession, ConsoleReporter, Harness, PasoResult, ScenarioRecord,
        Sequencer, SessionFactory,
    };
    use std::time::{Duration, Instant};

    struct CdpFactory {
        config: BrowserConfig,
    }

    #[async_trait::async_trait]
    impl SessionFactory for CdpFactory {
        type Session = CdpSession;

        async fn acquire(&mut self) -> PasoResult<CdpSession> {
            CdpSession::launch(self.config.clone()).await
        }
    }

    let mut config = BrowserConfig::default().with_headless(!args.headful);
    if args.no_sandbox {
        config = config.with_no_sandbox();
    }
    if let Some(path) = &args.chromium {
        config = config.with_chromium_path(path.clone());
    }

    let harness = Harness::new()
        .with_sequencer(Sequencer::new().with_default_wait(Duration::from_millis(args.wait_ms)))
        .keep_open(args.keep_open);
    let reporter = ConsoleReporter::new(!cli.no_color, cli.quiet || args.format == OutputFormat::Json);
    let mut progress = ProgressReporter::new(!cli.no_color, cli.quiet);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let started = Instant::now();
    let started_at = chrono::Utc::now();
    let mut factory = CdpFactory { config };
    let mut records: Vec<ScenarioRecord> = Vec::with_capacity(scenarios.len());

    progress.info(&format!("{} scenario(s) selected", scenarios.len()));
    progress.start(scenarios.len() as u64, "running scenarios");
    for scenario in &scenarios {
        progress.set_message(&scenario.name);
        let partial = runtime.block_on(harness.run(&mut factory, std::slice::from_ref(scenario)));
        progress.increment(1);
        for record in partial.records {
            reporter.report_scenario(&record);
            let failed = !record.passed();
            records.push(record);
            if failed && args.fail_fast {
                progress.finish();
                return finish_run(args, reporter, records, started, started_at);
            }
        }
    }
    progress.finish();
    finish_run(args, reporter, records, started, started_at)
}

#[cfg(feature = "browser")]
fn finish_run(
    args: &RunArgs,
    reporter: paso::ConsoleReporter,
    records: Vec<paso::ScenarioRecord>,
    started: std::time::Instant,
    started_at: chrono::DateTime<chrono::Utc>,
) -> CliResult<bool> {
    let report = paso::SuiteReport {
        run_id: uuid::Uuid::new_v4().to_string(),
        started_at,
        records,
        duration: started.elapsed(),
    };
    match args.format {
        OutputFormat::Text => reporter.summary(&report),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(paso::PasoError::from)?;
            println!("{json}");
        }
    }
    Ok(report.all_passed())
}

#[cfg(not(feature = "browser"))]
fn run_suite(_cli: &Cli, _args: &RunArgs, _scenarios: Vec<Scenario>) -> CliResult<bool> {
    Err(CliError::BrowserSupportDisabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_arguments_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["paso", "run"]);
        let Commands::Run(args) = &cli.command else {
            panic!("expected run command");
        };
        assert!(args.filter.is_none());
        assert!(!args.headful);
        assert_eq!(args.wait_ms, 5000);
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "paso",
            "run",
            "--filter",
            "checkbox",
            "--headful",
            "--keep-open",
            "--fail-fast",
            "--wait-ms",
            "2500",
            "--format",
            "json",
        ]);
        let Commands::Run(args) = &cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.filter.as_deref(), Some("checkbox"));
        assert!(args.headful);
        assert!(args.keep_open);
        assert!(args.fail_fast);
        assert_eq!(args.wait_ms, 2500);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_gather_scenarios_filters_by_name() {
        let scenarios = gather_scenarios(None, &[], Some("checkbox")).expect("gather");
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].name, "checkboxes");
    }

    #[test]
    fn test_gather_scenarios_without_filter_yields_catalog() {
        let scenarios = gather_scenarios(None, &[], None).expect("gather");
        assert_eq!(scenarios.len(), 8);
    }
}
