//! CLI configuration and layering of the run configuration

use refinery_smoke::SmokeConfig;
use serde::{Deserialize, Serialize};

use crate::commands::{ColorArg, RunArgs};
use crate::error::CliResult;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - failures only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - step logs on stderr
    Verbose,
    /// Debug - scripts and polling on stderr
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Log filter used when `RUST_LOG` is not set
    #[must_use]
    pub const fn default_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "warn,refinery_smoke=info,refinery_smoke_cli=info",
            Self::Debug => "info,refinery_smoke=debug,refinery_smoke_cli=debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Process-level CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set JSON logging
    #[must_use]
    pub const fn with_log_json(mut self, log_json: bool) -> Self {
        self.log_json = log_json;
        self
    }
}

/// Build the run configuration: defaults, then the YAML file, then flags.
///
/// The result is validated before it is returned.
pub fn resolve_smoke_config(args: &RunArgs) -> CliResult<SmokeConfig> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            SmokeConfig::from_yaml_file(path)?
        }
        None => SmokeConfig::default(),
    };

    if let Some(url) = &args.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(pin) = &args.pin {
        config.pin.clone_from(pin);
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir.clone_from(dir);
    }
    if let Some(pacing) = args.pacing {
        config.pacing = pacing.into();
    }
    if let Some(ms) = args.selector_timeout_ms {
        config.timeouts.selector_ms = ms;
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(path) = &args.chromium_path {
        config.browser.chromium_path = Some(path.clone());
    }
    if args.no_sandbox {
        config.browser.sandbox = false;
    }
    if let Some(viewport) = args.viewport {
        config.browser.viewport_width = viewport.width;
        config.browser.viewport_height = viewport.height;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{PacingArg, Viewport};
    use crate::error::CliError;
    use refinery_smoke::Pacing;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default_verbosity() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
        }

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
        }

        #[test]
        fn test_default_filter_widens_with_verbosity() {
            assert_eq!(Verbosity::Normal.default_filter(), "warn");
            assert!(Verbosity::Verbose
                .default_filter()
                .contains("refinery_smoke=info"));
            assert!(Verbosity::Debug
                .default_filter()
                .contains("refinery_smoke=debug"));
            assert!(Verbosity::Debug.is_verbose());
            assert!(!Verbosity::Normal.is_verbose());
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_color_choice_explicit() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }

        #[test]
        fn test_from_color_arg() {
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
        }

        #[test]
        fn test_cli_config_builder() {
            let config = CliConfig::new()
                .with_verbosity(Verbosity::Debug)
                .with_color(ColorChoice::Never)
                .with_log_json(true);
            assert_eq!(config.verbosity, Verbosity::Debug);
            assert_eq!(config.color, ColorChoice::Never);
            assert!(config.log_json);
        }
    }

    mod layering_tests {
        use super::*;

        #[test]
        fn test_no_args_gives_defaults() {
            let config = resolve_smoke_config(&RunArgs::default()).unwrap();
            assert_eq!(config, SmokeConfig::default());
        }

        #[test]
        fn test_flags_override_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("smoke.yaml");
            std::fs::write(
                &path,
                "base_url: http://127.0.0.1:9000\npin: \"4321\"\npacing: poll\n",
            )
            .unwrap();
            let args = RunArgs {
                config: Some(path),
                base_url: Some("http://127.0.0.1:5173".to_string()),
                pacing: Some(PacingArg::Fixed),
                ..RunArgs::default()
            };
            let config = resolve_smoke_config(&args).unwrap();
            assert_eq!(config.base_url, "http://127.0.0.1:5173");
            assert_eq!(config.pin, "4321");
            assert_eq!(config.pacing, Pacing::Fixed);
        }

        #[test]
        fn test_browser_flags() {
            let args = RunArgs {
                headed: true,
                no_sandbox: true,
                chromium_path: Some("/usr/bin/chromium".to_string()),
                viewport: Some(Viewport {
                    width: 640,
                    height: 480,
                }),
                selector_timeout_ms: Some(2_500),
                ..RunArgs::default()
            };
            let config = resolve_smoke_config(&args).unwrap();
            assert!(!config.browser.headless);
            assert!(!config.browser.sandbox);
            assert_eq!(config.browser.chromium_path.as_deref(), Some("/usr/bin/chromium"));
            assert_eq!(config.browser.viewport_width, 640);
            assert_eq!(config.timeouts.selector_ms, 2_500);
        }

        #[test]
        fn test_invalid_override_is_rejected() {
            let args = RunArgs {
                base_url: Some("localhost:5173".to_string()),
                ..RunArgs::default()
            };
            let err = resolve_smoke_config(&args).unwrap_err();
            assert!(matches!(err, CliError::Smoke(_)));
            assert!(err.to_string().contains("base_url"));
        }

        #[test]
        fn test_missing_file_is_rejected() {
            let args = RunArgs {
                config: Some("/nonexistent/refinery-smoke.yaml".into()),
                ..RunArgs::default()
            };
            assert!(resolve_smoke_config(&args).is_err());
        }
    }
}
