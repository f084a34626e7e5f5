//! Diagnostic log setup
//!
//! Logs go to stderr so the progress lines on stdout stay readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Build the log filter: `RUST_LOG` when set, otherwise the verbosity default
#[must_use]
pub fn log_filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.default_filter()))
}

/// Install the global subscriber
pub fn init_tracing(config: &CliConfig) -> CliResult<()> {
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.log_json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(log_filter(config))
        .try_init()
        .map_err(|e| CliError::logging(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Verbosity;

    #[test]
    fn test_filter_follows_verbosity() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let filter = log_filter(&CliConfig::new().with_verbosity(Verbosity::Debug));
        assert!(filter.to_string().contains("refinery_smoke=debug"));
    }
}
