//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Engine logs go to stderr, separate from the status text printed by the
//! output formatter. `RUST_LOG` overrides the level chosen from the flags.
//!
//! # Log Levels
//!
//! - `error`: only with `--quiet`
//! - `warn`: default; files that failed to load, edits that were not saved
//! - `info`: merge start and finish
//! - `debug`: with `--verbose`; ledger mutations and plan steps

use std::io::{self, IsTerminal};
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for this workspace's crates.
    pub level: Level,
    /// Whether to use ANSI colors.
    pub with_ansi: bool,
    /// Whether to print the module path of each event.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            with_ansi: io::stderr().is_terminal(),
            with_target: false,
        }
    }
}

impl LogConfig {
    /// Pick the level from `--verbose` / `--quiet`.
    #[must_use]
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        let level = if quiet {
            Level::ERROR
        } else if verbose {
            Level::DEBUG
        } else {
            Level::WARN
        };
        Self {
            level,
            with_target: verbose,
            ..Default::default()
        }
    }
}

/// Install the global subscriber, writing to stderr.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> bool {
    init_logging_with_writer(config, io::stderr)
}

/// Install the global subscriber with a custom writer.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> bool
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .compact()
        .with_writer(writer)
        .with_ansi(config.with_ansi)
        .with_target(config.with_target)
        .without_time();

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .try_init()
        .is_ok()
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(level)))
}

/// The library and binary (both `pdfstudio`) at `level`, everything else
/// (lopdf) at warn or quieter.
fn filter_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    let others = if level == "error" { "error" } else { "warn" };
    format!("{others},pdfstudio={level}")
}
