//! Source documents and their pages.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, StudioError};
use crate::model::{FileId, IdAllocator, PageId};
use crate::thumbnail::ThumbnailHandle;

/// Page rotation, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "u16")]
pub enum Rotation {
    /// Upright.
    #[default]
    Deg0,
    /// Rotated 90 degrees clockwise.
    Deg90,
    /// Rotated 180 degrees.
    Deg180,
    /// Rotated 270 degrees clockwise (90 counter-clockwise).
    Deg270,
}

impl Rotation {
    /// Quarter turn clockwise.
    pub const CLOCKWISE: Rotation = Rotation::Deg90;

    /// Quarter turn counter-clockwise.
    pub const COUNTER_CLOCKWISE: Rotation = Rotation::Deg270;

    /// Parse rotation from degrees.
    ///
    /// Any multiple of 90 is accepted, negative values included; the result
    /// is normalized into `0..360`.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::InvalidRotation`] if `degrees` is not a
    /// multiple of 90.
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(StudioError::InvalidRotation { degrees });
        }

        Ok(match degrees.rem_euclid(360) {
            0 => Self::Deg0,
            90 => Self::Deg90,
            180 => Self::Deg180,
            _ => Self::Deg270,
        })
    }

    /// Get rotation as degrees.
    pub fn as_degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Accumulate another rotation on top of this one, modulo 360.
    pub fn rotated(self, delta: Rotation) -> Self {
        let sum = i32::from(self.as_degrees()) + i32::from(delta.as_degrees());
        match sum % 360 {
            0 => Self::Deg0,
            90 => Self::Deg90,
            180 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    /// Whether this is the identity rotation.
    pub fn is_upright(self) -> bool {
        self == Self::Deg0
    }
}

impl TryFrom<i32> for Rotation {
    type Error = StudioError;

    fn try_from(degrees: i32) -> Result<Self> {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.as_degrees()
    }
}

/// One page of a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    id: PageId,
    source_document_id: FileId,
    source_page_index: usize,
    rotation: Rotation,
    is_deleted: bool,
    thumbnail: Option<ThumbnailHandle>,
}

impl Page {
    fn new(id: PageId, source_document_id: FileId, source_page_index: usize) -> Self {
        Self {
            id,
            source_document_id,
            source_page_index,
            rotation: Rotation::Deg0,
            is_deleted: false,
            thumbnail: None,
        }
    }

    /// Page id.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Owning document.
    pub fn source_document_id(&self) -> FileId {
        self.source_document_id
    }

    /// 0-based index into the source file's original page sequence.
    pub fn source_page_index(&self) -> usize {
        self.source_page_index
    }

    /// Accumulated rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Soft-delete flag.
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Inverse of [`Page::is_deleted`].
    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }

    /// Rendered thumbnail, if one has been attached since the last rotation.
    pub fn thumbnail(&self) -> Option<&ThumbnailHandle> {
        self.thumbnail.as_ref()
    }

    pub(crate) fn rotate(&mut self, delta: Rotation) {
        self.rotation = self.rotation.rotated(delta);
        self.thumbnail = None;
    }

    pub(crate) fn set_deleted(&mut self, deleted: bool) {
        self.is_deleted = deleted;
    }

    pub(crate) fn set_thumbnail(&mut self, handle: ThumbnailHandle) {
        self.thumbnail = Some(handle);
    }
}

/// An imported source file.
///
/// `pages` is kept in source order and never shrinks: deleting a page only
/// flags it, so `pages().len() == page_count()` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: FileId,
    path: PathBuf,
    name: String,
    title: Option<String>,
    pages: Vec<Page>,
}

impl Document {
    /// Create a document with one upright, live page per source page.
    pub fn new(
        ids: &mut IdAllocator,
        path: impl Into<PathBuf>,
        page_count: usize,
        title: Option<String>,
    ) -> Self {
        let path = path.into();
        let id = ids.file_id();
        let pages = (0..page_count)
            .map(|index| Page::new(ids.page_id(), id, index))
            .collect();

        Self {
            id,
            name: display_name(&path),
            path,
            title: title.filter(|t| !t.trim().is_empty()),
            pages,
        }
    }

    /// Document id.
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Location of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name (file name component of the path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Title from the PDF Info dictionary, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Original page count, deleted pages included.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages in source order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Pages that are not soft-deleted, in source order.
    pub fn live_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|page| page.is_live())
    }

    /// Number of pages that are not soft-deleted.
    pub fn live_page_count(&self) -> usize {
        self.live_pages().count()
    }

    /// Look up a page by id.
    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == id)
    }

    /// Look up a page by its 0-based source index.
    pub fn page_at(&self, index: usize) -> Result<&Page> {
        self.pages
            .get(index)
            .ok_or_else(|| StudioError::PageIndexOutOfBounds {
                path: self.path.clone(),
                index,
                page_count: self.pages.len(),
            })
    }

    pub(crate) fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|page| page.id == id)
    }

    pub(crate) fn pages_mut(&mut self) -> impl Iterator<Item = &mut Page> {
        self.pages.iter_mut()
    }
}

/// File name component of `path`, falling back to the whole path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Find a document by id.
pub fn find_document(documents: &[Document], id: FileId) -> Option<&Document> {
    documents.iter().find(|doc| doc.id() == id)
}

/// Find a live page and its document. Deleted pages resolve to `None`.
pub fn resolve_live_page(
    documents: &[Document],
    file: FileId,
    page: PageId,
) -> Option<(&Document, &Page)> {
    let doc = find_document(documents, file)?;
    let page = doc.page(page).filter(|page| page.is_live())?;
    Some((doc, page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Rotation::Deg0)]
    #[case(90, Rotation::Deg90)]
    #[case(180, Rotation::Deg180)]
    #[case(270, Rotation::Deg270)]
    #[case(360, Rotation::Deg0)]
    #[case(-90, Rotation::Deg270)]
    #[case(450, Rotation::Deg90)]
    fn test_rotation_from_degrees(#[case] degrees: i32, #[case] expected: Rotation) {
        assert_eq!(Rotation::from_degrees(degrees).unwrap(), expected);
    }

    #[rstest]
    #[case(45)]
    #[case(100)]
    #[case(-30)]
    fn test_rotation_rejects_non_quarter_turns(#[case] degrees: i32) {
        assert!(matches!(
            Rotation::from_degrees(degrees),
            Err(StudioError::InvalidRotation { .. })
        ));
    }

    #[test]
    fn test_rotation_accumulates_modulo_360() {
        let mut rotation = Rotation::Deg0;
        for expected in [90, 180, 270, 0, 90] {
            rotation = rotation.rotated(Rotation::CLOCKWISE);
            assert_eq!(rotation.as_degrees(), expected);
        }
        assert_eq!(
            Rotation::Deg0.rotated(Rotation::COUNTER_CLOCKWISE),
            Rotation::Deg270
        );
    }

    #[test]
    fn test_rotation_serde_as_number() {
        let json = serde_json::to_string(&Rotation::Deg180).unwrap();
        assert_eq!(json, "180");
        let back: Rotation = serde_json::from_str("-90").unwrap();
        assert_eq!(back, Rotation::Deg270);
        assert!(serde_json::from_str::<Rotation>("33").is_err());
    }

    #[test]
    fn test_new_document_pages() {
        let mut ids = IdAllocator::new();
        let doc = Document::new(&mut ids, "/tmp/scans/report.pdf", 3, None);

        assert_eq!(doc.name(), "report.pdf");
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.live_page_count(), 3);
        for (index, page) in doc.pages().iter().enumerate() {
            assert_eq!(page.source_page_index(), index);
            assert_eq!(page.source_document_id(), doc.id());
            assert!(page.rotation().is_upright());
            assert!(page.is_live());
        }
    }

    #[test]
    fn test_soft_delete_keeps_page_count() {
        let mut ids = IdAllocator::new();
        let mut doc = Document::new(&mut ids, "a.pdf", 2, None);
        let first = doc.pages()[0].id();
        doc.page_mut(first).unwrap().set_deleted(true);

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.live_page_count(), 1);
        assert!(resolve_live_page(std::slice::from_ref(&doc), doc.id(), first).is_none());
    }

    #[test]
    fn test_page_at_out_of_bounds() {
        let mut ids = IdAllocator::new();
        let doc = Document::new(&mut ids, "a.pdf", 2, None);
        assert!(matches!(
            doc.page_at(2),
            Err(StudioError::PageIndexOutOfBounds {
                index: 2,
                page_count: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_blank_title_is_dropped() {
        let mut ids = IdAllocator::new();
        let doc = Document::new(&mut ids, "a.pdf", 1, Some("   ".into()));
        assert_eq!(doc.title(), None);
    }
}
