//! Building merged documents with lopdf.

pub mod merger;
pub mod pages;

pub use merger::PdfMerger;
pub use pages::PageExtractor;
