//! LintGate - minimal static-analysis quality gate
//!
//! A CLI tool that runs a fixed, ordered list of external analysis
//! tools against a target path, relays their findings, and exits with
//! a single aggregate status.
//!
//! Exit codes:
//!   0 - Every step exited 0
//!   N - The first non-zero exit code reported by a step, in step order.
//!       Steps that failed to launch, timed out or were killed by a signal
//!       record -1, -2 and -3, which the OS reports as 255, 254 and 253.
//!   1 - Also used for fatal errors (invalid target, bad config/arguments)

mod cli;
mod config;
mod error;
mod models;
mod orchestrator;
mod report;

use anyhow::Result;
use cli::{Args, OutputFormat};
use config::Config;
use models::AnalysisStep;
use orchestrator::runner::validate_target;
use orchestrator::{summarize, Orchestrator, Relay, RunOptions};
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --print-config early (no logging needed)
    if args.print_config {
        print!("{}", Config::default_toml());
        return Ok(());
    }

    // Initialize logging
    init_logging(&args);

    info!("LintGate v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_gate(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so they never mix with relayed tool stdout.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run every configured step and return the aggregate exit code.
async fn run_gate(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let target = config.target();
    let steps = config.steps(args.only.as_deref())?;

    if args.dry_run {
        return handle_dry_run(&target, &steps);
    }

    let orchestrator = Orchestrator::new(RunOptions {
        fail_fast: config.general.fail_fast,
        show_progress: !args.quiet,
    });
    let mut relay = Relay::console();

    let run_report = orchestrator.run(&target, &steps, &mut relay).await?;
    let exit_code = summarize(&run_report);

    match args.format {
        OutputFormat::Json => println!("{}", report::generate_json_report(&run_report)?),
        OutputFormat::Text if !args.quiet => {
            print!("{}", report::generate_text_summary(&run_report))
        }
        OutputFormat::Text => {}
    }

    info!(
        "Completed {} of {} step(s), exit code {}",
        run_report.len(),
        steps.len(),
        exit_code
    );

    Ok(exit_code)
}

/// Handle --dry-run: print the resolved command lines, run nothing.
///
/// The target is checked the same way a real run checks it.
fn handle_dry_run(target: &Path, steps: &[AnalysisStep]) -> Result<i32> {
    validate_target(target)?;
    let target = target.display().to_string();

    println!("🔍 Dry run: {} step(s) would run against {}\n", steps.len(), target);
    for (i, step) in steps.iter().enumerate() {
        let timeout = step
            .timeout
            .map(|t| format!(" (timeout {}s)", t.as_secs()))
            .unwrap_or_default();
        println!("   {}. {}: {}{}", i + 1, step.name, step.command_line(&target), timeout);
    }

    println!("\n✅ Dry run complete. No tools were executed.");
    Ok(0)
}

/// Load configuration from the explicit path, or use the built-in defaults.
fn load_config(args: &Args) -> Result<Config> {
    match args.config {
        Some(ref config_path) => {
            info!("Loading config from: {}", config_path.display());
            Config::load(config_path)
        }
        None => {
            debug!("No config file given, using default steps");
            Ok(Config::default())
        }
    }
}
