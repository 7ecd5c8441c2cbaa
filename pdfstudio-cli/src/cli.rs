//! CLI argument parsing for pdfstudio.
//!
//! Flags refine a [`Config`] that may come from a `--config` file: a flag
//! given on the command line always wins over the file.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use pdfstudio::config::{CompressionLevel, Config, EditMode, OverwriteMode};
use pdfstudio::error::{Result, StudioError};
use pdfstudio::utils::collect_paths_for_patterns;

/// Arrange pages from many PDF files into a single document.
///
/// Files are imported in the order given, then an optional plan moves,
/// deletes and rotates pages before the result is merged.
#[derive(Parser, Debug)]
#[command(name = "pdfstudio")]
#[command(version)]
#[command(about = "Arrange pages from many PDF files into a single document", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input PDF files, in import order
    ///
    /// Glob patterns are expanded; matches are sorted.
    ///
    /// Examples:
    ///   pdfstudio cover.pdf body.pdf -o book.pdf
    ///   pdfstudio 'scans/*.pdf' --plan order.json -o scans.pdf
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output PDF file path
    ///
    /// Defaults to a timestamped merged-*.pdf in the configured output
    /// directory.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// JSON plan of moves, deletions and rotations to apply before merging
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Dry run - show the arranged pages and merge plan without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose output - show per-file details and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Compression level for output PDF
    ///
    /// - none: No compression (preserves exact quality)
    /// - standard: Balanced compression (default)
    /// - maximum: Also drop unreachable objects
    #[arg(short, long, value_name = "LEVEL")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: Option<String>,

    /// Write plan rotations into the source files
    ///
    /// By default source files are never modified and rotations are
    /// applied while merging.
    #[arg(long)]
    pub in_place: bool,

    /// Number of files inspected concurrently on import
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

impl Cli {
    /// Build the session config: the `--config` file (or defaults), then
    /// flags on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, a flag value is
    /// invalid, or the result fails [`Config::validate`].
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }

        if let Some(level) = &self.compression {
            config.compression = CompressionLevel::from_str(level)?;
        }

        if self.force {
            config.overwrite_mode = OverwriteMode::Force;
        } else if self.no_clobber {
            config.overwrite_mode = OverwriteMode::NoClobber;
        }

        if self.in_place {
            config.edit_mode = EditMode::InPlace;
        }

        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate CLI arguments before processing.
    ///
    /// # Errors
    ///
    /// Returns an error if no inputs are given or `--jobs` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(StudioError::invalid_config("No input files specified"));
        }

        if self.jobs == Some(0) {
            return Err(StudioError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        Ok(())
    }

    /// Expand input patterns into paths, in argument order.
    ///
    /// # Errors
    ///
    /// [`StudioError::NothingToMerge`] if the patterns match nothing.
    pub fn resolve_inputs(&self) -> Result<Vec<PathBuf>> {
        let paths = collect_paths_for_patterns(&self.inputs)?;
        if paths.is_empty() {
            return Err(StudioError::NothingToMerge);
        }
        Ok(paths)
    }
}
