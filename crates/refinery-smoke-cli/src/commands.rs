//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// refinery-smoke: headless storage verification for the Idea Refinery app
#[derive(Parser, Debug)]
#[command(name = "refinery-smoke")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures are printed)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit diagnostic logs as JSON lines on stderr
    #[arg(long, global = true, env = "REFINERY_SMOKE_LOG_JSON")]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the verification against a running app
    Run(RunArgs),

    /// Print the effective configuration as YAML
    Config(RunArgs),
}

/// Options shared by `run` and `config`; flags override the config file
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// YAML configuration file
    #[arg(short, long, env = "REFINERY_SMOKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address of the running app
    #[arg(long, env = "REFINERY_SMOKE_BASE_URL")]
    pub base_url: Option<String>,

    /// PIN typed at the lock screen
    #[arg(long, env = "REFINERY_SMOKE_PIN")]
    pub pin: Option<String>,

    /// Directory receiving screenshots
    #[arg(short, long, env = "REFINERY_SMOKE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// How to let the app settle between steps
    #[arg(long, env = "REFINERY_SMOKE_PACING")]
    pub pacing: Option<PacingArg>,

    /// Upper bound for selector waits in milliseconds
    #[arg(long)]
    pub selector_timeout_ms: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Path to the chromium binary
    #[arg(long, env = "REFINERY_SMOKE_CHROMIUM_PATH")]
    pub chromium_path: Option<String>,

    /// Disable the browser sandbox (containers/CI)
    #[arg(long, env = "REFINERY_SMOKE_NO_SANDBOX")]
    pub no_sandbox: bool,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_viewport)]
    pub viewport: Option<Viewport>,
}

/// Viewport dimensions parsed from `WIDTHxHEIGHT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width: u32 = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let height: u32 = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    if width == 0 || height == 0 {
        return Err("viewport dimensions must be positive".to_string());
    }
    Ok(Viewport { width, height })
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Pacing argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingArg {
    /// Sleep for the full delay after each step
    Fixed,
    /// Poll for the expected state, bounded by the same delay
    Poll,
}

impl From<PacingArg> for refinery_smoke::Pacing {
    fn from(arg: PacingArg) -> Self {
        match arg {
            PacingArg::Fixed => Self::Fixed,
            PacingArg::Poll => Self::Poll,
        }
    }
}
