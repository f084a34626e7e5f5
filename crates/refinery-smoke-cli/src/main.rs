//! refinery-smoke: verify conversation storage in a running Idea Refinery app
//!
//! ## Usage
//!
//! ```bash
//! refinery-smoke run                                # defaults, http://localhost:5173
//! refinery-smoke run --pacing poll --no-sandbox     # CI-friendly
//! refinery-smoke config --config smoke.yaml         # show the effective configuration
//! ```

use clap::Parser;
use refinery_smoke_cli::{
    init_tracing, resolve_smoke_config, Cli, CliConfig, CliError, CliResult, Commands, RunArgs,
    Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from CLI args
    let config = build_config(&cli);
    init_tracing(&config)?;

    match cli.command {
        Commands::Run(args) => run_verification(&config, &args),
        Commands::Config(args) => show_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into())
        .with_log_json(cli.log_json)
}

fn show_config(args: &RunArgs) -> CliResult<()> {
    let smoke = resolve_smoke_config(args)?;
    let yaml = serde_yaml_ng::to_string(&smoke).map_err(|e| CliError::config(e.to_string()))?;
    print!("{yaml}");
    Ok(())
}

/// Check results never change the exit code; only failures before the run do.
#[cfg(feature = "browser")]
fn run_verification(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    use refinery_smoke::{ChromiumDriver, VerificationRunner};
    use refinery_smoke_cli::ProgressReporter;

    let smoke = resolve_smoke_config(args)?;
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let driver = ChromiumDriver::launch(smoke.browser.clone()).await?;
        let mut runner = VerificationRunner::new(driver, smoke);
        let outcome = runner.run(&reporter).await;
        reporter.summary(&outcome);
        tracing::info!(
            completed = outcome.completed(),
            failed_checks = outcome.failed(),
            "run finished"
        );
        Ok::<(), CliError>(())
    })
}

#[cfg(not(feature = "browser"))]
fn run_verification(_config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    resolve_smoke_config(args)?;
    Err(CliError::invalid_argument(
        "browser support not enabled. Rebuild with --features browser",
    ))
}
