//! PDF saving.
//!
//! Writes go through a temp file in the destination directory and are
//! renamed into place, so a failed save never leaves a half-written file
//! where a source or output used to be. Serialization runs on the blocking
//! pool.

use lopdf::Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;
use tracing::debug;

use crate::error::{Result, StudioError};

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write to a temp file, then rename.
    pub atomic: bool,

    /// Compress streams before writing.
    pub compress: bool,

    /// Renumber objects densely before writing.
    pub renumber: bool,

    /// Create missing parent directories.
    pub create_dirs: bool,

    /// Write buffer size in bytes.
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            compress: false,
            renumber: true,
            create_dirs: true,
            buffer_size: 64 * 1024,
        }
    }
}

/// What a save produced.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time spent serializing and writing.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Final location.
    pub output_path: PathBuf,
}

/// Saves lopdf documents.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Writer options.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Save `doc` to `path`.
    ///
    /// # Errors
    ///
    /// [`StudioError::FailedToCreateOutput`] if the file (or its directory)
    /// cannot be created, [`StudioError::FailedToWrite`] if serialization or
    /// the final rename fails.
    pub async fn save(&self, doc: Document, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        let stats = task::spawn_blocking(move || write_blocking(doc, path_buf, &options))
            .await
            .map_err(|e| StudioError::other(format!("Write task failed: {e}")))??;

        debug!(
            path = %stats.output_path.display(),
            bytes = stats.file_size,
            write_time = ?stats.write_time,
            "PDF written"
        );
        Ok(stats)
    }

    /// Whether something already exists at `path`.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

fn write_blocking(mut doc: Document, path: PathBuf, options: &WriteOptions) -> Result<WriteStatistics> {
    let start = Instant::now();

    if options.compress {
        doc.compress();
    }
    if options.renumber {
        doc.renumber_objects();
    }

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let (true, Some(parent)) = (options.create_dirs, parent) {
        std::fs::create_dir_all(parent).map_err(|e| StudioError::FailedToCreateOutput {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let write_path = if options.atomic {
        temp_path_for(&path)
    } else {
        path.clone()
    };

    let result = write_file(&mut doc, &write_path, options.buffer_size).and_then(|()| {
        if options.atomic {
            std::fs::rename(&write_path, &path).map_err(|e| StudioError::FailedToWrite {
                path: path.clone(),
                source: e,
            })?;
        }
        Ok(())
    });

    if result.is_err() && options.atomic {
        let _ = std::fs::remove_file(&write_path);
    }
    result?;

    let file_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    Ok(WriteStatistics {
        write_time: start.elapsed(),
        file_size,
        output_path: path,
    })
}

fn write_file(doc: &mut Document, path: &Path, buffer_size: usize) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| StudioError::FailedToCreateOutput {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);

    doc.save_to(&mut writer)
        .map_err(|e| StudioError::FailedToWrite {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

    writer.flush().map_err(|e| StudioError::FailedToWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Hidden sibling of `path` used for atomic writes.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.pdf".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}
