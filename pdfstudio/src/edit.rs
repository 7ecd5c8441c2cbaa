//! lopdf-backed page editor.
//!
//! Applies a [`PageOperation`] to a source file and writes it back through
//! [`PdfWriter`], so the original is replaced atomically or not at all.
//! Requests are validated before anything is written.

use lopdf::Document;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, StudioError};
use crate::io::{PdfReader, PdfWriter};
use crate::merge::PageExtractor;
use crate::services::{PageEditor, PageOperation};

/// Edits pages of PDF files in place.
#[derive(Debug, Clone, Default)]
pub struct PdfEditor {
    reader: PdfReader,
    pages: PageExtractor,
    writer: PdfWriter,
}

impl PdfEditor {
    /// Create an editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `operation` to an already loaded document.
    ///
    /// # Errors
    ///
    /// - [`StudioError::PageIndexOutOfBounds`] for indices past the last page
    /// - [`StudioError::InvalidEdit`] when deleting every page, or when a
    ///   reorder is not a permutation of all pages
    pub fn apply_to_document(
        &self,
        doc: &mut Document,
        path: &Path,
        operation: &PageOperation,
    ) -> Result<()> {
        match operation {
            PageOperation::Rotate { pages, rotation } => {
                let ids = self.pages.select(doc, path, pages)?;
                for id in ids {
                    self.pages.rotate_page(doc, id, *rotation)?;
                }
            }
            PageOperation::Delete { pages } => {
                let all = self.pages.page_ids(doc);
                self.pages.select(doc, path, pages)?;

                let doomed: BTreeSet<usize> = pages.iter().copied().collect();
                if doomed.len() >= all.len() {
                    return Err(StudioError::invalid_edit(path, "cannot delete every page"));
                }
                let kept: Vec<_> = all
                    .into_iter()
                    .enumerate()
                    .filter(|(index, _)| !doomed.contains(index))
                    .map(|(_, id)| id)
                    .collect();

                self.pages.set_page_tree(doc, &kept)?;
                doc.prune_objects();
            }
            PageOperation::Reorder { order } => {
                let count = self.pages.page_count(doc);
                let distinct: BTreeSet<usize> = order.iter().copied().collect();
                if order.len() != count || distinct.len() != count {
                    return Err(StudioError::invalid_edit(
                        path,
                        format!("reorder must list each of the {count} page(s) exactly once"),
                    ));
                }
                let ids = self.pages.select(doc, path, order)?;
                self.pages.set_page_tree(doc, &ids)?;
            }
        }
        Ok(())
    }
}

impl PageEditor for PdfEditor {
    async fn apply(&self, path: &Path, operation: &PageOperation) -> Result<()> {
        let mut doc = self.reader.load(path).await?.document;
        self.apply_to_document(&mut doc, path, operation)?;

        self.writer
            .save(doc, path)
            .await
            .map_err(|e| StudioError::edit_failed(path, e.to_string()))?;

        debug!(path = %path.display(), ?operation, "page edit saved");
        Ok(())
    }
}
