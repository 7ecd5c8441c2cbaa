//! The merge-order ledger.
//!
//! The ledger is the single authoritative output order: a flat sequence of
//! `(file, page)` entries, one per live page. Every mutator keeps two
//! invariants: an entry never refers to a deleted page, and a page appears
//! at most once.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::model::{Document, FileId, PageId};

/// One position in the merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Owning document.
    pub file_id: FileId,
    /// Page placed at this position.
    pub page_id: PageId,
}

impl LedgerEntry {
    /// Create an entry.
    pub fn new(file_id: FileId, page_id: PageId) -> Self {
        Self { file_id, page_id }
    }
}

/// Ordered list of live `(file, page)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the ledger that corresponds to "no customization ever happened":
    /// each document's live pages in source order, documents in slice order.
    pub fn rebuild_from_file_order(documents: &[Document]) -> Self {
        let mut ledger = Self::new();
        for doc in documents {
            ledger.append(doc);
        }
        ledger
    }

    /// Entries in output order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Iterate over entries in output order.
    pub fn iter(&self) -> std::slice::Iter<'_, LedgerEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of `page` in the ledger.
    pub fn position(&self, page: PageId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.page_id == page)
    }

    /// Whether `page` has an entry.
    pub fn contains(&self, page: PageId) -> bool {
        self.position(page).is_some()
    }

    /// Entries that belong to `file`, in ledger order.
    pub fn pages_of(&self, file: FileId) -> impl Iterator<Item = PageId> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.file_id == file)
            .map(|entry| entry.page_id)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Append the live pages of `document`, in source order.
    pub fn append(&mut self, document: &Document) {
        self.insert_at(std::iter::once(document), None);
    }

    /// Insert the live pages of each document, documents in the given order,
    /// immediately before the entry for `before`.
    ///
    /// A `None` or stale `before` appends at the end. Pages that already
    /// have an entry are left where they are.
    pub fn insert_at<'a>(
        &mut self,
        documents: impl IntoIterator<Item = &'a Document>,
        before: Option<PageId>,
    ) {
        let mut present: HashSet<PageId> = self.entries.iter().map(|e| e.page_id).collect();
        let block: Vec<LedgerEntry> = documents
            .into_iter()
            .flat_map(|doc| {
                doc.live_pages()
                    .map(move |page| LedgerEntry::new(doc.id(), page.id()))
            })
            .filter(|entry| present.insert(entry.page_id))
            .collect();

        if block.is_empty() {
            return;
        }

        let at = self.insertion_point(before);
        debug!(count = block.len(), at, "inserting pages into merge order");
        self.entries.splice(at..at, block);
    }

    /// Insert a single entry before `before` (or at the end).
    ///
    /// Returns `false` if the page already has an entry.
    pub fn insert_entry(&mut self, entry: LedgerEntry, before: Option<PageId>) -> bool {
        if self.contains(entry.page_id) {
            return false;
        }
        let at = self.insertion_point(before);
        self.entries.insert(at, entry);
        true
    }

    /// Insert a single entry immediately after `after`, or at the end if
    /// `after` has no entry.
    pub fn insert_entry_after(&mut self, entry: LedgerEntry, after: PageId) -> bool {
        if self.contains(entry.page_id) {
            return false;
        }
        let at = self.position(after).map_or(self.entries.len(), |i| i + 1);
        self.entries.insert(at, entry);
        true
    }

    /// Remove every entry of `file`. Returns the number removed.
    pub fn remove_file(&mut self, file: FileId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.file_id != file);
        before - self.entries.len()
    }

    /// Remove the entry for `page`. Returns whether one existed.
    pub fn remove_page(&mut self, page: PageId) -> bool {
        match self.position(page) {
            Some(at) => {
                self.entries.remove(at);
                true
            }
            None => false,
        }
    }

    /// Move all of `file`'s entries, keeping their relative order, to
    /// immediately before `target` (or to the end).
    ///
    /// Returns `true` if the ledger changed. Dropping a file onto one of its
    /// own pages, or onto the spot it already occupies, leaves the ledger
    /// untouched.
    pub fn move_file(&mut self, file: FileId, target: Option<PageId>) -> bool {
        let onto_itself = target.is_some_and(|target| {
            self.entries
                .iter()
                .any(|entry| entry.page_id == target && entry.file_id == file)
        });
        if onto_itself {
            debug!(%file, "file dropped onto itself, ignoring");
            return false;
        }

        let (block, rest): (Vec<LedgerEntry>, Vec<LedgerEntry>) = self
            .entries
            .iter()
            .copied()
            .partition(|entry| entry.file_id == file);

        if block.is_empty() {
            debug!(%file, "file has no entries to move");
            return false;
        }

        let at = Self::insertion_point_in(&rest, target);
        let mut moved = rest;
        moved.splice(at..at, block);
        self.commit(moved)
    }

    /// Move the entry for `page` to immediately before `target` (or to the end).
    ///
    /// Returns `true` if the ledger changed.
    pub fn move_page(&mut self, page: PageId, target: Option<PageId>) -> bool {
        if target == Some(page) {
            return false;
        }
        let Some(from) = self.position(page) else {
            debug!(%page, "page has no entry to move");
            return false;
        };

        let mut moved = self.entries.clone();
        let entry = moved.remove(from);
        let at = Self::insertion_point_in(&moved, target);
        moved.insert(at, entry);
        self.commit(moved)
    }

    /// Drop entries whose page is not live in `documents`. Returns the
    /// number of entries removed.
    pub fn prune(&mut self, documents: &[Document]) -> usize {
        let live: HashSet<(FileId, PageId)> = documents
            .iter()
            .flat_map(|doc| doc.live_pages().map(move |page| (doc.id(), page.id())))
            .collect();
        let before = self.entries.len();
        self.entries
            .retain(|entry| live.contains(&(entry.file_id, entry.page_id)));
        before - self.entries.len()
    }

    fn commit(&mut self, moved: Vec<LedgerEntry>) -> bool {
        if moved == self.entries {
            debug!("move leaves merge order unchanged");
            return false;
        }
        self.entries = moved;
        true
    }

    fn insertion_point(&self, before: Option<PageId>) -> usize {
        Self::insertion_point_in(&self.entries, before)
    }

    fn insertion_point_in(entries: &[LedgerEntry], before: Option<PageId>) -> usize {
        let Some(target) = before else {
            return entries.len();
        };
        match entries.iter().position(|entry| entry.page_id == target) {
            Some(at) => at,
            None => {
                debug!(%target, "stale insertion target, appending at end");
                entries.len()
            }
        }
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a LedgerEntry;
    type IntoIter = std::slice::Iter<'a, LedgerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<LedgerEntry> for Ledger {
    /// Collect entries, keeping only the first occurrence of each page.
    fn from_iter<T: IntoIterator<Item = LedgerEntry>>(iter: T) -> Self {
        let mut seen = HashSet::new();
        Self {
            entries: iter
                .into_iter()
                .filter(|entry| seen.insert(entry.page_id))
                .collect(),
        }
    }
}
