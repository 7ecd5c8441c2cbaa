//! Selection overlay.
//!
//! Selection is independent of ordering and grouping. It works in one of two
//! modes; switching modes clears it. Range selection runs over whatever id
//! order the caller displays, normally the card order from
//! [`flatten`](crate::grouping::flatten).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::{FileId, PageId};

/// What the user is selecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Whole files.
    #[default]
    File,
    /// Individual pages.
    Page,
}

/// A selectable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum SelectionKey {
    /// A file.
    File(FileId),
    /// A page.
    Page(PageId),
}

impl From<FileId> for SelectionKey {
    fn from(id: FileId) -> Self {
        SelectionKey::File(id)
    }
}

impl From<PageId> for SelectionKey {
    fn from(id: PageId) -> Self {
        SelectionKey::Page(id)
    }
}

/// Selected ids plus the anchor for range selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    mode: SelectionMode,
    selected: HashSet<SelectionKey>,
    last_selected: Option<SelectionKey>,
}

impl Selection {
    /// Empty selection in file mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Anchor for the next range selection.
    pub fn last_selected(&self) -> Option<SelectionKey> {
        self.last_selected
    }

    /// Number of selected ids.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether `key` is selected.
    pub fn is_selected(&self, key: impl Into<SelectionKey>) -> bool {
        self.selected.contains(&key.into())
    }

    /// Iterate over selected ids (unordered).
    pub fn iter(&self) -> impl Iterator<Item = SelectionKey> + '_ {
        self.selected.iter().copied()
    }

    /// Selected files (unordered).
    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.selected.iter().filter_map(|key| match key {
            SelectionKey::File(id) => Some(*id),
            SelectionKey::Page(_) => None,
        })
    }

    /// Selected pages (unordered).
    pub fn pages(&self) -> impl Iterator<Item = PageId> + '_ {
        self.selected.iter().filter_map(|key| match key {
            SelectionKey::Page(id) => Some(*id),
            SelectionKey::File(_) => None,
        })
    }

    /// Switch mode. Always clears the selection.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        self.clear();
    }

    /// Replace the selection with `key`.
    pub fn select(&mut self, key: impl Into<SelectionKey>) {
        let key = key.into();
        self.selected.clear();
        self.selected.insert(key);
        self.last_selected = Some(key);
    }

    /// Flip `key` and make it the range anchor.
    pub fn toggle(&mut self, key: impl Into<SelectionKey>) {
        let key = key.into();
        if !self.selected.remove(&key) {
            self.selected.insert(key);
        }
        self.last_selected = Some(key);
    }

    /// Flip a file together with its pages.
    ///
    /// If the file is selected, the file and every page in `pages` are
    /// deselected; otherwise all of them are selected.
    pub fn toggle_file_with_pages(&mut self, file: FileId, pages: &[PageId]) {
        let file_key = SelectionKey::File(file);
        let page_keys = pages.iter().copied().map(SelectionKey::Page);

        if self.selected.remove(&file_key) {
            for key in page_keys {
                self.selected.remove(&key);
            }
        } else {
            self.selected.insert(file_key);
            self.selected.extend(page_keys);
        }
        self.last_selected = Some(file_key);
    }

    /// Add the slice between the anchor and `target` (inclusive) in
    /// `displayed` order.
    ///
    /// Without an anchor, or if either end is not displayed, this behaves
    /// like [`Selection::select`].
    pub fn select_range<K: Into<SelectionKey> + Copy>(&mut self, displayed: &[K], target: K) {
        let target = target.into();
        let position = |key: SelectionKey| {
            displayed
                .iter()
                .position(|&k| Into::<SelectionKey>::into(k) == key)
        };

        let bounds = self
            .last_selected
            .and_then(position)
            .zip(position(target));
        let Some((from, to)) = bounds else {
            self.select(target);
            return;
        };

        let (start, end) = (from.min(to), from.max(to));
        self.selected.extend(
            displayed[start..=end]
                .iter()
                .map(|&k| Into::<SelectionKey>::into(k)),
        );
        self.last_selected = Some(target);
    }

    /// Replace the selection with `keys`; the last one becomes the anchor.
    pub fn select_all<K: Into<SelectionKey>>(&mut self, keys: impl IntoIterator<Item = K>) {
        self.selected.clear();
        self.last_selected = None;
        for key in keys {
            let key = key.into();
            self.selected.insert(key);
            self.last_selected = Some(key);
        }
    }

    /// Deselect `keys`. Drops the anchor if it was among them.
    pub fn remove<K: Into<SelectionKey>>(&mut self, keys: impl IntoIterator<Item = K>) {
        for key in keys {
            let key = key.into();
            self.selected.remove(&key);
            if self.last_selected == Some(key) {
                self.last_selected = None;
            }
        }
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.last_selected = None;
    }
}
