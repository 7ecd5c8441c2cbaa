//! Error types for pdfstudio.
//!
//! Errors fall into three groups:
//!
//! - **Validation errors** are raised locally and never reach a collaborator:
//!   an empty merge, deleting the last page of a document, a page index past
//!   the end of a file.
//! - **Collaborator failures** come from the lopdf-backed services (loading,
//!   merging, editing, writing). Some of them degrade gracefully at the call
//!   site instead of propagating, e.g. a failed metadata lookup on import.
//! - **Cancellation** and catch-all errors.
//!
//! Stale ids (a drop target deleted mid-drag) are not errors at all; the
//! ordering core resolves them by appending at the end.

use std::io;
use std::path::PathBuf;

use crate::model::{FileId, PageId};

/// Result type alias for pdfstudio operations.
pub type Result<T> = std::result::Result<T, StudioError>;

/// Main error type for pdfstudio operations.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// The built merge request has no segments.
    #[error("Nothing to merge: every page has been deleted or no files are loaded")]
    NothingToMerge,

    /// Deleting would leave a document without any live page.
    #[error("Cannot delete every page of {name}; remove the file instead")]
    LastPageDeletion {
        /// Document that would have been emptied.
        file: FileId,
        /// Display name of the document.
        name: String,
    },

    /// A page index does not exist in the file.
    #[error("Page index {index} is out of bounds for {} ({page_count} page(s))", .path.display())]
    PageIndexOutOfBounds {
        /// File the index refers to.
        path: PathBuf,
        /// Offending 0-based index.
        index: usize,
        /// Number of pages in the file.
        page_count: usize,
    },

    /// No document with this id is loaded.
    #[error("Unknown file: {0}")]
    UnknownFile(FileId),

    /// No page with this id exists.
    #[error("Unknown page: {0}")]
    UnknownPage(PageId),

    /// Rotation is not a multiple of 90 degrees.
    #[error("Invalid rotation: {degrees}. Must be a multiple of 90")]
    InvalidRotation {
        /// Requested rotation.
        degrees: i32,
    },

    /// A session plan step could not be applied.
    #[error("Invalid plan step {step}: {reason}")]
    InvalidPlan {
        /// 1-based step number.
        step: usize,
        /// What went wrong.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A page edit request was rejected before touching the file.
    #[error("Invalid edit for {}: {reason}", .path.display())]
    InvalidEdit {
        /// File being edited.
        path: PathBuf,
        /// Why the edit was rejected.
        reason: String,
    },

    /// Input file was not found.
    #[error("File not found: {}", .path.display())]
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// Failed to load a PDF file.
    #[error("Failed to load PDF: {}\n  Reason: {reason}", .path.display())]
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// PDF file is encrypted and cannot be processed.
    #[error(
        "PDF is encrypted and cannot be processed: {}\n  Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools",
        .path.display()
    )]
    EncryptedPdf {
        /// Path to the encrypted PDF.
        path: PathBuf,
    },

    /// The merge collaborator failed.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// Persisting a page edit to disk failed.
    #[error("Failed to edit {}: {reason}", .path.display())]
    EditFailed {
        /// File being edited.
        path: PathBuf,
        /// Description of what went wrong.
        reason: String,
    },

    /// Thumbnail rendering failed.
    #[error("Failed to render thumbnail for page {} of {}: {reason}", .index + 1, .path.display())]
    RenderFailed {
        /// Source file.
        path: PathBuf,
        /// 0-based page index.
        index: usize,
        /// Description of what went wrong.
        reason: String,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  Use --force to overwrite or choose a different output path",
        .path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", .path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", .path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Malformed JSON in a config or plan file.
    #[error("Failed to parse {}: {source}", .path.display())]
    Json {
        /// File being parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl StudioError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an EncryptedPdf error.
    pub fn encrypted_pdf(path: impl Into<PathBuf>) -> Self {
        Self::EncryptedPdf { path: path.into() }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create an EditFailed error.
    pub fn edit_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::EditFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidEdit error.
    pub fn invalid_edit(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidEdit {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: impl Into<PathBuf>) -> Self {
        Self::OutputExists { path: path.into() }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an InvalidPlan error.
    pub fn invalid_plan(step: usize, reason: impl Into<String>) -> Self {
        Self::InvalidPlan {
            step,
            reason: reason.into(),
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether the error was raised by local validation, before any
    /// collaborator or file was touched. State is unchanged after these.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NothingToMerge
                | Self::LastPageDeletion { .. }
                | Self::PageIndexOutOfBounds { .. }
                | Self::UnknownFile(_)
                | Self::UnknownPage(_)
                | Self::InvalidRotation { .. }
                | Self::InvalidPlan { .. }
                | Self::InvalidConfig { .. }
                | Self::InvalidEdit { .. }
        )
    }

    /// Check if the session can carry on after this error.
    ///
    /// Per-file collaborator failures are recoverable: the file is skipped
    /// or a default is used.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FailedToLoadPdf { .. }
                | Self::EncryptedPdf { .. }
                | Self::FileNotFound { .. }
                | Self::EditFailed { .. }
                | Self::RenderFailed { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NothingToMerge => 1,
            Self::LastPageDeletion { .. } => 1,
            Self::PageIndexOutOfBounds { .. } => 1,
            Self::UnknownFile(_) => 1,
            Self::UnknownPage(_) => 1,
            Self::InvalidRotation { .. } => 1,
            Self::InvalidPlan { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::InvalidEdit { .. } => 1,
            Self::FileNotFound { .. } => 2,
            Self::Json { .. } => 2,
            Self::FailedToLoadPdf { .. } => 3,
            Self::EncryptedPdf { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::Io(_) => 5,
            Self::MergeFailed { .. } => 6,
            Self::EditFailed { .. } => 6,
            Self::RenderFailed { .. } => 6,
            Self::Cancelled => 130,
            Self::Other { .. } => 1,
        }
    }
}
