//! Domain model: documents, pages, ids and rotation.

mod document;
mod id;

pub use document::{Document, Page, Rotation, display_name, find_document, resolve_live_page};
pub use id::{FileId, IdAllocator, PageId};
