//! Page-tree operations on lopdf documents.
//!
//! Shared by the merger and the page editor:
//! - resolving 0-based page indices to page objects
//! - rotating individual pages
//! - rebuilding the root page tree from an explicit page list

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

use crate::error::{Result, StudioError};
use crate::model::Rotation;

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Page-level manipulation helpers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageExtractor;

impl PageExtractor {
    /// Create a page extractor.
    pub fn new() -> Self {
        Self
    }

    /// Number of pages in `doc`.
    pub fn page_count(&self, doc: &Document) -> usize {
        doc.get_pages().len()
    }

    /// Page object ids in page order.
    pub fn page_ids(&self, doc: &Document) -> Vec<ObjectId> {
        doc.get_pages().into_values().collect()
    }

    /// Resolve 0-based `indices` to page object ids, in the given order.
    ///
    /// # Errors
    ///
    /// [`StudioError::PageIndexOutOfBounds`] for an index past the last page.
    pub fn select(&self, doc: &Document, path: &Path, indices: &[usize]) -> Result<Vec<ObjectId>> {
        let all = self.page_ids(doc);
        indices
            .iter()
            .map(|&index| {
                all.get(index)
                    .copied()
                    .ok_or_else(|| StudioError::PageIndexOutOfBounds {
                        path: path.to_path_buf(),
                        index,
                        page_count: all.len(),
                    })
            })
            .collect()
    }

    /// Add `rotation` to the page's `/Rotate`, normalized into `0..360`.
    ///
    /// An inherited `/Rotate` counts as the starting value.
    pub fn rotate_page(&self, doc: &mut Document, page_id: ObjectId, rotation: Rotation) -> Result<()> {
        if rotation.is_upright() {
            return Ok(());
        }
        let current = inherited(doc, page_id, b"Rotate")
            .and_then(|r| r.as_i64().ok())
            .unwrap_or(0);

        let page = page_dict_mut(doc, page_id)?;
        let degrees = (current + i64::from(rotation.as_degrees())).rem_euclid(360);
        page.set("Rotate", Object::Integer(degrees));
        Ok(())
    }

    /// Make the root `/Pages` node list exactly `page_ids`, in order.
    ///
    /// Pages are re-parented to the root; attributes they inherited from an
    /// intermediate node are copied onto the page first.
    pub fn set_page_tree(&self, doc: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
        let pages_id = root_pages_id(doc)?;

        for &page_id in page_ids {
            materialize_inherited(doc, page_id, pages_id)?;
            page_dict_mut(doc, page_id)?.set("Parent", Object::Reference(pages_id));
        }

        let pages = doc
            .get_object_mut(pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| StudioError::merge_failed(format!("Failed to get pages object: {e}")))?;
        let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
        pages.set("Kids", Object::Array(kids));
        pages.set("Count", Object::Integer(page_ids.len() as i64));
        Ok(())
    }
}

/// Id of the catalog's `/Pages` node.
pub fn root_pages_id(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| StudioError::merge_failed(format!("Failed to get pages reference: {e}")))
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| StudioError::merge_failed(format!("Failed to get page {page_id:?}: {e}")))
}

/// Value of `key` on the page or its nearest ancestor.
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    // Bounded walk: malformed files may contain parent cycles.
    for _ in 0..64 {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Copy inherited attributes onto the page unless they come from `root`,
/// which the page keeps inheriting from.
fn materialize_inherited(doc: &mut Document, page_id: ObjectId, root: ObjectId) -> Result<()> {
    let parent = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Parent").and_then(Object::as_reference).ok());
    if parent.is_none() || parent == Some(root) {
        return Ok(());
    }

    let copied: Vec<(&[u8], Object)> = INHERITABLE
        .iter()
        .filter_map(|&key| inherited(doc, page_id, key).map(|value| (key, value)))
        .collect();

    let page = page_dict_mut(doc, page_id)?;
    for (key, value) in copied {
        if !page.has(key) {
            page.set(key.to_vec(), value);
        }
    }
    Ok(())
}
