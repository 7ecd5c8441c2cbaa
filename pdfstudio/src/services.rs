//! Boundaries to the collaborators that touch file bytes.
//!
//! The ordering core never reads or writes PDF data itself. It talks to
//! these traits; the crate ships lopdf-backed implementations
//! ([`PdfReader`](crate::io::PdfReader), [`PdfMerger`](crate::merge::PdfMerger),
//! [`PdfEditor`](crate::edit::PdfEditor)) and tests plug in fakes.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::Rotation;
use crate::request::MergeRequest;
use crate::thumbnail::{ThumbnailHandle, ThumbnailKey};

/// What an import needs to know about a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    /// Number of pages.
    pub page_count: usize,
    /// Title from the Info dictionary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Merge progress, reported once per segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeProgress {
    /// 1-based index of the segment just finished.
    pub current: usize,
    /// Number of segments.
    pub total: usize,
}

impl MergeProgress {
    /// Completion in whole percent.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = self.current.min(self.total) * 100 / self.total;
        pct as u8
    }
}

/// Result of a finished merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// Where the merged document was written.
    pub output_path: PathBuf,
    /// Pages in the merged document.
    pub total_pages: usize,
}

/// A change applied to one file's pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PageOperation {
    /// Rotate pages (0-based indices) by a quarter-turn multiple.
    Rotate {
        /// Pages to rotate.
        pages: Vec<usize>,
        /// Rotation to add.
        rotation: Rotation,
    },
    /// Remove pages (0-based indices).
    Delete {
        /// Pages to remove.
        pages: Vec<usize>,
    },
    /// Reorder pages; `order[i]` is the old index of the new i-th page.
    Reorder {
        /// Permutation of every page index.
        order: Vec<usize>,
    },
}

/// Reads page count and title from a source file.
pub trait MetadataSource: Sync {
    /// Inspect one file.
    fn pdf_info(&self, path: &Path) -> impl Future<Output = Result<PdfInfo>> + Send;
}

/// Produces the merged document from a built request.
pub trait MergeBackend: Sync {
    /// Merge `request` into `output`, calling `progress` after each segment.
    fn merge(
        &self,
        request: &MergeRequest,
        output: &Path,
        progress: &mut (dyn FnMut(MergeProgress) + Send),
    ) -> impl Future<Output = Result<MergeOutcome>> + Send;
}

/// Persists page edits into a source file.
pub trait PageEditor: Sync {
    /// Apply `operation` to the file at `path`.
    fn apply(
        &self,
        path: &Path,
        operation: &PageOperation,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Renders page previews.
pub trait ThumbnailRenderer: Sync {
    /// Render the page identified by `key`.
    fn render(&self, key: &ThumbnailKey) -> impl Future<Output = Result<ThumbnailHandle>> + Send;
}
