//! PDF loading.
//!
//! Documents are read with `tokio::fs` and parsed on the blocking pool, so a
//! large file never stalls the runtime. Batches load with bounded
//! parallelism and come back in input order.
//!
//! # Examples
//!
//! ```no_run
//! use pdfstudio::io::PdfReader;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! for result in reader.load_all(&paths, 4).await {
//!     let loaded = result?;
//!     println!("{}: {} pages", loaded.path.display(), loaded.page_count);
//! }
//! # Ok(())
//! # }
//! ```

use lopdf::{Dictionary, Document, Object};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{Result, StudioError};
use crate::services::{MetadataSource, PdfInfo};

/// A parsed PDF plus what the session needs to know about it.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The parsed document.
    pub document: Document,

    /// Source file.
    pub path: PathBuf,

    /// Number of pages.
    pub page_count: usize,

    /// Title from the Info dictionary.
    pub title: Option<String>,

    /// Time spent reading and parsing.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

impl LoadedPdf {
    /// Page count and title.
    pub fn info(&self) -> PdfInfo {
        PdfInfo {
            page_count: self.page_count,
            title: self.title.clone(),
        }
    }
}

/// Result of loading one file.
pub type LoadResult = Result<LoadedPdf>;

/// Loads PDF files.
#[derive(Debug, Clone)]
pub struct PdfReader {
    verify: bool,
}

impl PdfReader {
    /// Reader that rejects documents without pages.
    pub fn new() -> Self {
        Self { verify: true }
    }

    /// Reader that accepts any document lopdf can parse.
    pub fn without_verification() -> Self {
        Self { verify: false }
    }

    /// Load one PDF.
    ///
    /// # Errors
    ///
    /// - [`StudioError::FileNotFound`] if `path` does not exist
    /// - [`StudioError::EncryptedPdf`] for password-protected files
    /// - [`StudioError::FailedToLoadPdf`] if parsing fails or, when
    ///   verifying, the document has no pages
    pub async fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let start = Instant::now();
        let path_buf = path.to_path_buf();

        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StudioError::file_not_found(path_buf.clone()),
            _ => StudioError::failed_to_load_pdf(path_buf.clone(), e.to_string()),
        })?;
        let file_size = bytes.len() as u64;

        let parse_path = path_buf.clone();
        let document = tokio::task::spawn_blocking(move || Document::load_mem(&bytes))
            .await
            .map_err(|e| StudioError::failed_to_load_pdf(path_buf.clone(), e.to_string()))?
            .map_err(|e| classify_load_error(&parse_path, e))?;

        if document.is_encrypted() {
            return Err(StudioError::encrypted_pdf(path_buf));
        }

        let page_count = document.get_pages().len();
        if self.verify && page_count == 0 {
            return Err(StudioError::failed_to_load_pdf(path_buf, "PDF has no pages"));
        }

        let title = read_title(&document);
        let load_time = start.elapsed();
        debug!(path = %path_buf.display(), page_count, ?load_time, "loaded PDF");

        Ok(LoadedPdf {
            document,
            path: path_buf,
            page_count,
            title,
            load_time,
            file_size,
        })
    }

    /// Load several PDFs one after another.
    pub async fn load_sequential(&self, paths: &[PathBuf]) -> Vec<LoadResult> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            results.push(self.load(path).await);
        }
        results
    }

    /// Load several PDFs with up to `workers` in flight.
    ///
    /// Results are in the same order as `paths`.
    pub async fn load_parallel(&self, paths: &[PathBuf], workers: usize) -> Vec<LoadResult> {
        self.load_with_progress(paths, workers, |_, _| {}).await
    }

    /// Load all PDFs, in parallel for larger batches.
    pub async fn load_all(&self, paths: &[PathBuf], max_workers: usize) -> Vec<LoadResult> {
        if paths.len() <= 3 {
            self.load_sequential(paths).await
        } else {
            self.load_parallel(paths, max_workers).await
        }
    }

    /// Load in parallel, calling `on_progress(index, result)` for each file
    /// in input order once the batch is done.
    pub async fn load_with_progress<F>(
        &self,
        paths: &[PathBuf],
        workers: usize,
        mut on_progress: F,
    ) -> Vec<LoadResult>
    where
        F: FnMut(usize, &LoadResult),
    {
        use futures::stream::{self, StreamExt};

        let workers = workers.max(1);

        let tasks = paths.iter().cloned().enumerate().map(|(idx, path)| {
            let reader = self.clone();
            async move { (idx, reader.load(&path).await) }
        });

        let mut indexed: Vec<(usize, LoadResult)> = stream::iter(tasks)
            .buffer_unordered(workers)
            .collect()
            .await;
        indexed.sort_by_key(|(idx, _)| *idx);

        indexed
            .into_iter()
            .map(|(idx, result)| {
                on_progress(idx, &result);
                result
            })
            .collect()
    }

    /// Page count and title of one file, without keeping the document.
    pub async fn read_info(&self, path: &Path) -> Result<PdfInfo> {
        Ok(self.load(path).await?.info())
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSource for PdfReader {
    async fn pdf_info(&self, path: &Path) -> Result<PdfInfo> {
        self.read_info(path).await
    }
}

fn classify_load_error(path: &Path, error: lopdf::Error) -> StudioError {
    let message = error.to_string();
    let lower = message.to_lowercase();
    if lower.contains("encrypt") || lower.contains("password") {
        StudioError::encrypted_pdf(path.to_path_buf())
    } else {
        StudioError::failed_to_load_pdf(path.to_path_buf(), message)
    }
}

/// Title from the trailer's Info dictionary, if set and non-empty.
pub fn read_title(doc: &Document) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let dict: &Dictionary = match info {
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    match dict.get(b"Title").ok()? {
        Object::String(bytes, _) => decode_text(bytes).filter(|t| !t.trim().is_empty()),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, otherwise UTF-8 / Latin-1.
fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).ok();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(_) => Some(bytes.iter().map(|&b| b as char).collect()),
    }
}
