//! CopperGuard CLI - PCB design rule checks from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use copperguard::{
    generate_sample_rules, DrcCore, DrcEngine, DrcOptions, DrcReport, DrcViolation, ErrorCode,
    RuleSet, Severity,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::Level;

#[derive(Parser)]
#[command(name = "copperguard")]
#[command(about = "PCB design rule checker for board snapshots", long_about = None)]
#[command(version)]
struct Cli {
    /// Log engine activity to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a board snapshot against a rule set
    Check {
        /// Path to the board snapshot (.json)
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        /// Rule set (.json); without it no constraints apply
        #[arg(short, long, value_name = "RULES")]
        rules: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if violations found at this severity or higher
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,

        /// Report at most this many violations per error code
        #[arg(long, value_name = "N")]
        error_limit: Option<usize>,

        /// Run only these providers (repeatable)
        #[arg(long = "provider", value_name = "NAME")]
        providers: Vec<String>,
    },

    /// List the available check providers
    Providers {
        /// Show the error codes each provider reports
        #[arg(short, long)]
        detailed: bool,
    },

    /// Print a sample rule set
    SampleRules {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            board,
            rules,
            format,
            fail_on,
            error_limit,
            providers,
        } => handle_check(
            &board,
            rules.as_deref(),
            format,
            fail_on,
            error_limit,
            providers,
        ),
        Commands::Providers { detailed } => {
            handle_providers(detailed);
            Ok(0)
        }
        Commands::SampleRules { output } => handle_sample_rules(output.as_deref()).map(|_| 0),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_check(
    board_path: &Path,
    rules_path: Option<&Path>,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
    error_limit: Option<usize>,
    providers: Vec<String>,
) -> Result<i32> {
    let board = DrcCore::load_board(board_path)
        .with_context(|| format!("failed to load board {}", board_path.display()))?;

    let rules = match rules_path {
        Some(path) => DrcCore::load_rules(path)
            .with_context(|| format!("failed to load rules {}", path.display()))?,
        None => RuleSet::default(),
    };

    let mut options = rules.settings.clone();
    if error_limit.is_some() {
        options.error_limit = error_limit;
    }
    if !providers.is_empty() {
        check_provider_names(&providers)?;
        options.providers = providers;
    }

    let report = DrcCore::check_board(&board, &rules, options)?;
    output_report(&report, &format)?;

    let failed = match fail_on {
        Some(FailOnSeverity::Error) => report.has_errors(),
        Some(FailOnSeverity::Warning) => report.has_warnings_or_errors(),
        None => false,
    };

    Ok(if failed || !report.summary.completed { 1 } else { 0 })
}

fn check_provider_names(names: &[String]) -> Result<()> {
    let engine = DrcEngine::with_default_providers(DrcOptions::default());
    for name in names {
        if !engine.providers().iter().any(|p| p.name() == name) {
            anyhow::bail!("unknown provider '{}' (see `copperguard providers`)", name);
        }
    }
    Ok(())
}

fn output_report(report: &DrcReport, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => output_human(report),
        OutputFormat::Json => output_json(report)?,
        OutputFormat::Github => output_github(report),
    }
    Ok(())
}

fn print_group(title: &str, violations: &[&DrcViolation]) {
    if violations.is_empty() {
        return;
    }
    println!("\n  {}:", title);
    for v in violations {
        println!("    - {}", v.message);
        println!(
            "      at ({:.3}, {:.3}){}",
            v.position.x,
            v.position.y,
            v.layer
                .as_ref()
                .map(|l| format!(" on {}", l))
                .unwrap_or_default()
        );
    }
}

fn output_human(report: &DrcReport) {
    println!("\nBoard: {}", report.board);
    println!("Rules: {}", report.rule_set);
    println!("{}", "─".repeat(60));

    for message in &report.messages {
        println!("  note: {}", message);
    }

    if !report.summary.completed {
        println!("  Check cancelled");
    }

    if report.total_violations() == 0 {
        println!("  No violations found");
        return;
    }

    let errors: Vec<_> = report
        .violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .collect();
    let warnings: Vec<_> = report
        .violations
        .iter()
        .filter(|v| v.severity == Severity::Warning)
        .collect();

    print_group("ERRORS", &errors);
    print_group("WARNINGS", &warnings);

    println!("\n  Summary:");
    for code in ErrorCode::all() {
        let count = report.summary.count(*code);
        if count > 0 {
            println!("    {:<24} {}", code.title(), count);
        }
    }
    println!("    Errors:   {}", report.summary.errors);
    println!("    Warnings: {}", report.summary.warnings);
}

fn output_json(report: &DrcReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn severity_to_github(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Ignore => "notice",
    }
}

fn output_github(report: &DrcReport) {
    for v in &report.violations {
        println!(
            "::{} file={},title={}::{}",
            severity_to_github(v.severity),
            report.board,
            v.code.title(),
            v.message.replace('\n', " ")
        );
    }
}

fn handle_providers(detailed: bool) {
    println!("Available check providers:\n");

    let engine = DrcEngine::with_default_providers(DrcOptions::default());
    for provider in engine.providers() {
        println!("  {}", provider.name());
        println!("    {}", provider.description());
        if detailed {
            let codes: Vec<_> = provider.error_codes().iter().map(|c| c.key()).collect();
            println!("    reports: {}", codes.join(", "));
        }
        println!();
    }
}

fn handle_sample_rules(output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&generate_sample_rules())?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
