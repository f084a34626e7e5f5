//! refinery-smoke CLI library
//!
//! Argument parsing, configuration layering, log setup, and the terminal
//! progress reporter behind the `refinery-smoke` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
mod logging;
mod output;

pub use commands::{parse_viewport, Cli, ColorArg, Commands, PacingArg, RunArgs, Viewport};
pub use config::{resolve_smoke_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::{init_tracing, log_filter};
pub use output::ProgressReporter;
