//! lopdf-backed merge backend.
//!
//! Copies the requested pages of every segment into a fresh document, in
//! request order. A source that appears in several segments is parsed once;
//! each segment works on its own copy so the same page may be emitted twice.

use lopdf::{Document, Object, ObjectId, dictionary};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::CompressionLevel;
use crate::error::{Result, StudioError};
use crate::io::{PdfReader, PdfWriter};
use crate::merge::pages::PageExtractor;
use crate::request::{FilePayload, MergeRequest};
use crate::services::{MergeBackend, MergeOutcome, MergeProgress};

/// Merges PDF files described by a [`MergeRequest`].
#[derive(Debug, Clone)]
pub struct PdfMerger {
    reader: PdfReader,
    pages: PageExtractor,
    writer: PdfWriter,
    compression: CompressionLevel,
    jobs: usize,
}

impl PdfMerger {
    /// Merger with standard compression.
    pub fn new() -> Self {
        Self {
            reader: PdfReader::new(),
            pages: PageExtractor::new(),
            writer: PdfWriter::new(),
            compression: CompressionLevel::default(),
            jobs: 4,
        }
    }

    /// Use `compression` for the output.
    pub fn with_compression(mut self, compression: CompressionLevel) -> Self {
        self.compression = compression;
        self
    }

    /// Load at most `jobs` sources at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Compression applied to the output.
    pub fn compression(&self) -> CompressionLevel {
        self.compression
    }

    /// Build the merged document in memory.
    ///
    /// # Errors
    ///
    /// - [`StudioError::NothingToMerge`] for an empty request
    /// - load errors for unreadable sources
    /// - [`StudioError::PageIndexOutOfBounds`] if a segment names a page the
    ///   file does not have
    pub async fn merge_document(
        &self,
        request: &MergeRequest,
        progress: &mut (dyn FnMut(MergeProgress) + Send),
    ) -> Result<Document> {
        if request.is_empty() {
            return Err(StudioError::NothingToMerge);
        }

        let sources = self.load_sources(request).await?;

        let mut merged = Document::with_version("1.5");
        let pages_id = merged.new_object_id();
        let catalog_id = merged.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        merged.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        merged.trailer.set("Root", catalog_id);

        let total = request.len();
        let mut max_id = merged.max_id;
        let mut kids: Vec<ObjectId> = Vec::new();

        for (index, segment) in request.files.iter().enumerate() {
            let source = sources.get(&segment.path).ok_or_else(|| {
                StudioError::merge_failed(format!("Source not loaded: {}", segment.path.display()))
            })?;

            let mut doc = source.clone();
            doc.renumber_objects_with(max_id + 1);
            max_id = max_id.max(doc.max_id);

            let page_ids = self.copy_segment(&mut doc, segment)?;
            debug!(
                path = %segment.path.display(),
                pages = page_ids.len(),
                "copied segment"
            );

            kids.extend(page_ids);
            merged.objects.extend(doc.objects);

            progress(MergeProgress {
                current: index + 1,
                total,
            });
        }

        if kids.is_empty() {
            return Err(StudioError::merge_failed("Request selects no pages"));
        }

        merged.max_id = max_id;
        self.pages.set_page_tree(&mut merged, &kids)?;

        match self.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => merged.compress(),
            CompressionLevel::Maximum => {
                merged.prune_objects();
                merged.compress();
            }
        }

        Ok(merged)
    }

    /// Select and rotate the pages one segment contributes.
    fn copy_segment(&self, doc: &mut Document, segment: &FilePayload) -> Result<Vec<ObjectId>> {
        let indices: Vec<usize> = match &segment.pages {
            Some(pages) => pages.clone(),
            None => (0..self.pages.page_count(doc)).collect(),
        };
        let page_ids = self.pages.select(doc, &segment.path, &indices)?;

        for (position, &page_id) in page_ids.iter().enumerate() {
            self.pages
                .rotate_page(doc, page_id, segment.rotation_at(position))?;
        }
        Ok(page_ids)
    }

    async fn load_sources(&self, request: &MergeRequest) -> Result<HashMap<PathBuf, Document>> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for segment in &request.files {
            if !paths.contains(&segment.path) {
                paths.push(segment.path.clone());
            }
        }

        let mut sources = HashMap::with_capacity(paths.len());
        for result in self.reader.load_all(&paths, self.jobs).await {
            let loaded = result?;
            sources.insert(loaded.path, loaded.document);
        }
        Ok(sources)
    }
}

impl Default for PdfMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeBackend for PdfMerger {
    async fn merge(
        &self,
        request: &MergeRequest,
        output: &Path,
        progress: &mut (dyn FnMut(MergeProgress) + Send),
    ) -> Result<MergeOutcome> {
        let start = Instant::now();
        info!(
            segments = request.len(),
            output = %output.display(),
            "merge started"
        );

        let document = self.merge_document(request, progress).await?;
        let total_pages = document.get_pages().len();
        let stats = self.writer.save(document, output).await?;

        info!(
            total_pages,
            bytes = stats.file_size,
            elapsed = ?start.elapsed(),
            "merge finished"
        );
        Ok(MergeOutcome {
            output_path: stats.output_path,
            total_pages,
        })
    }
}
