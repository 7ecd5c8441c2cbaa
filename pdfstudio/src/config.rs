//! Session configuration.
//!
//! A [`Config`] can be loaded from a JSON file (camelCase keys, every field
//! optional) and is then refined by CLI flags. It controls:
//! - where merged output goes and how existing files are treated
//! - whether page edits touch source files or travel with the merge request
//! - drag-leave debounce, compression and load parallelism

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::drag::DEFAULT_HOVER_DEBOUNCE;
use crate::error::{Result, StudioError};

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression - preserves exact structure.
    None,
    /// Compress content streams.
    #[default]
    Standard,
    /// Compress and drop unreachable objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(StudioError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

impl FromStr for OverwriteMode {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "prompt" => Ok(Self::Prompt),
            "force" => Ok(Self::Force),
            "no-clobber" => Ok(Self::NoClobber),
            _ => Err(StudioError::invalid_config(format!(
                "Invalid overwrite mode: {s}. Must be one of: prompt, force, no-clobber"
            ))),
        }
    }
}

/// Where page rotations end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditMode {
    /// Rotations are written into the source file right away.
    InPlace,
    /// Sources are never touched; rotations are applied while merging.
    #[default]
    Deferred,
}

impl EditMode {
    /// Whether rotations must be carried in the merge request.
    pub fn rotations_in_request(&self) -> bool {
        matches!(self, Self::Deferred)
    }
}

impl FromStr for EditMode {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "in-place" => Ok(Self::InPlace),
            "deferred" => Ok(Self::Deferred),
            _ => Err(StudioError::invalid_config(format!(
                "Invalid edit mode: {s}. Must be one of: in-place, deferred"
            ))),
        }
    }
}

/// Complete configuration for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Directory for merged output when no explicit path is set.
    pub output_dir: PathBuf,

    /// Explicit output path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Whether edits touch the source files.
    pub edit_mode: EditMode,

    /// Drag-leave debounce in milliseconds.
    pub hover_debounce_ms: u64,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Number of parallel loads (None = auto-detect).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output: None,
            edit_mode: EditMode::default(),
            hover_debounce_ms: DEFAULT_HOVER_DEBOUNCE.as_millis() as u64,
            compression: CompressionLevel::default(),
            overwrite_mode: OverwriteMode::default(),
            jobs: None,
        }
    }
}

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "PDF Studio";

impl Config {
    /// Load a config file.
    ///
    /// # Errors
    ///
    /// [`StudioError::FileNotFound`] if `path` is missing,
    /// [`StudioError::Json`] if it is not a valid config.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StudioError::file_not_found(path),
            _ => StudioError::Io(e),
        })?;
        serde_json::from_str(&text).map_err(|source| StudioError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::InvalidConfig`] if:
    /// - Jobs count is zero
    /// - The explicit output path does not end in `.pdf`
    pub fn validate(&self) -> Result<()> {
        if self.jobs == Some(0) {
            return Err(StudioError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        if let Some(output) = &self.output {
            let is_pdf = output
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if !is_pdf {
                return Err(StudioError::invalid_config(format!(
                    "Output file must have a .pdf extension: {}",
                    output.display()
                )));
            }
        }

        Ok(())
    }

    /// Get the effective number of parallel jobs.
    ///
    /// Returns the configured job count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Drag-leave debounce.
    pub fn hover_debounce(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }

    /// Output path: the explicit one, or a timestamped file in `output_dir`.
    pub fn resolve_output_path(&self, now: DateTime<Utc>) -> PathBuf {
        match &self.output {
            Some(output) => output.clone(),
            None => self.output_dir.join(merged_file_name(now)),
        }
    }

    /// [`resolve_output_path`](Self::resolve_output_path) at the current time.
    pub fn output_path(&self) -> PathBuf {
        self.resolve_output_path(Utc::now())
    }
}

/// `merged-<timestamp>.pdf` with a filesystem-safe timestamp.
pub fn merged_file_name(now: DateTime<Utc>) -> String {
    format!("merged-{}.pdf", now.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}
