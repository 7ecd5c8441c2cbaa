//! pdfstudio - Arrange pages from many PDF files into a single document.
//!
//! This library is the engine behind a page-arranging merge tool:
//!
//! - An ordered ledger of `(file, page)` entries that is the one source of
//!   output order
//! - Grouping of consecutive same-file pages into collapsible cards
//! - Drag-and-drop resolution with a debounced hover target
//! - Merge-request building, selection and soft deletion
//! - lopdf-backed metadata reading, page editing and merging
//!
//! # Examples
//!
//! ## Arrange and merge
//!
//! ```no_run
//! use pdfstudio::io::PdfReader;
//! use pdfstudio::merge::PdfMerger;
//! use pdfstudio::Workspace;
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut workspace = Workspace::new();
//! let files = workspace
//!     .import(&PdfReader::new(), &[PathBuf::from("a.pdf"), PathBuf::from("b.pdf")])
//!     .await;
//!
//! // Put the second file first.
//! let first_page = workspace.ledger().entries()[0].page_id;
//! workspace.move_file(files[1], Some(first_page))?;
//!
//! let outcome = workspace
//!     .merge(&PdfMerger::new(), Path::new("merged.pdf"))
//!     .await?;
//! println!("Created {} page document", outcome.total_pages);
//! # Ok(())
//! # }
//! ```
//!
//! ## Ordering without files
//!
//! ```
//! use pdfstudio::grouping::flatten;
//! use pdfstudio::ledger::Ledger;
//! use pdfstudio::model::{Document, IdAllocator};
//! use std::collections::HashSet;
//!
//! let mut ids = IdAllocator::new();
//! let a = Document::new(&mut ids, "a.pdf", 2, None);
//! let b = Document::new(&mut ids, "b.pdf", 1, None);
//! let documents = vec![a, b];
//!
//! let mut ledger = Ledger::rebuild_from_file_order(&documents);
//! ledger.move_file(documents[1].id(), Some(documents[0].pages()[0].id()));
//!
//! let cards = flatten(&documents, &ledger, &HashSet::new());
//! assert_eq!(cards.len(), 3);
//! assert_eq!(cards[0].file_id(), documents[1].id());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod drag;
pub mod edit;
pub mod error;
pub mod grouping;
pub mod io;
pub mod ledger;
pub mod merge;
pub mod model;
pub mod output;
pub mod plan;
pub mod request;
pub mod selection;
pub mod services;
pub mod thumbnail;
pub mod utils;
pub mod workspace;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{Config, EditMode};
pub use error::{Result, StudioError};
pub use grouping::Card;
pub use model::{Document, FileId, Page, PageId, Rotation};
pub use request::{FilePayload, MergeRequest};
pub use workspace::{MergeStatus, Workspace};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
