//! Groups and display cards derived from the ledger.
//!
//! A group is a maximal run of consecutive ledger entries from one file.
//! [`flatten`] turns the groups into the card list a view renders: one card
//! per page for expanded groups, one card per group for collapsed ones.
//! Nothing here is stored; everything is recomputed from the ledger.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use crate::ledger::{Ledger, LedgerEntry};
use crate::model::{Document, FileId, Page, PageId, Rotation, find_document};

/// Identity of a group, derived from its first page.
///
/// Collapse state is keyed by this id, so it survives reordering elsewhere
/// in the ledger. It changes when the group's first page changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupId(PageId);

impl GroupId {
    /// Group id for a run starting with `first_page`.
    pub fn from_first_page(first_page: PageId) -> Self {
        Self(first_page)
    }

    /// The page the id is derived from.
    pub fn first_page(self) -> PageId {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0.get())
    }
}

/// Set of collapsed groups. Groups not in the set are expanded.
pub type CollapsedGroups = HashSet<GroupId>;

/// A maximal run of same-file ledger entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Derived id.
    pub id: GroupId,
    /// File the run belongs to.
    pub file_id: FileId,
    /// Pages in ledger order.
    pub page_ids: Vec<PageId>,
}

/// Partition `entries` into maximal same-file runs.
pub fn group_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for entry in entries {
        match groups.last_mut() {
            Some(group) if group.file_id == entry.file_id => group.page_ids.push(entry.page_id),
            _ => groups.push(Group {
                id: GroupId::from_first_page(entry.page_id),
                file_id: entry.file_id,
                page_ids: vec![entry.page_id],
            }),
        }
    }
    groups
}

/// Collapsed card standing for a whole group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCard {
    /// Position in the card list.
    pub flat_index: usize,
    /// Group shown by this card.
    pub group_id: GroupId,
    /// Owning file.
    pub file_id: FileId,
    /// Position of the file in the document list.
    pub file_index: usize,
    /// File display name.
    pub name: String,
    /// File location.
    pub path: PathBuf,
    /// Number of pages in the group.
    pub group_page_count: usize,
    /// Drop anchor: dropping onto this card inserts before this page.
    pub first_page_id: PageId,
    /// Pages of the group in ledger order.
    pub group_page_ids: Vec<PageId>,
    /// 0-based source indices of the group's pages, in ledger order.
    pub source_page_indices: Vec<usize>,
}

/// Card for one page of an expanded group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCard {
    /// Position in the card list.
    pub flat_index: usize,
    /// Group the page belongs to.
    pub group_id: GroupId,
    /// Owning file.
    pub file_id: FileId,
    /// Position of the file in the document list.
    pub file_index: usize,
    /// File display name.
    pub name: String,
    /// File location.
    pub path: PathBuf,
    /// The page.
    pub page_id: PageId,
    /// 0-based index in the source file.
    pub source_page_index: usize,
    /// Current rotation.
    pub rotation: Rotation,
    /// First card of its group.
    pub is_first_of_group: bool,
    /// Shows the first page of its source file.
    pub is_first_page: bool,
}

/// One displayable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Card {
    /// A collapsed group.
    File(FileCard),
    /// A page of an expanded group.
    Page(PageCard),
}

impl Card {
    /// Position in the card list.
    pub fn flat_index(&self) -> usize {
        match self {
            Card::File(card) => card.flat_index,
            Card::Page(card) => card.flat_index,
        }
    }

    /// Owning file.
    pub fn file_id(&self) -> FileId {
        match self {
            Card::File(card) => card.file_id,
            Card::Page(card) => card.file_id,
        }
    }

    /// Group the card belongs to.
    pub fn group_id(&self) -> GroupId {
        match self {
            Card::File(card) => card.group_id,
            Card::Page(card) => card.group_id,
        }
    }

    /// Page a drop onto this card inserts before.
    pub fn anchor_page_id(&self) -> PageId {
        match self {
            Card::File(card) => card.first_page_id,
            Card::Page(card) => card.page_id,
        }
    }

    /// Pages shown by this card, in order.
    pub fn page_ids(&self) -> &[PageId] {
        match self {
            Card::File(card) => &card.group_page_ids,
            Card::Page(card) => std::slice::from_ref(&card.page_id),
        }
    }

    /// Whether this is a collapsed group.
    pub fn is_collapsed(&self) -> bool {
        matches!(self, Card::File(_))
    }
}

/// Derive the card list from the ledger and the collapse state.
///
/// Groups are cut from the ledger as stored; entries whose page is deleted
/// or unknown are then dropped from their group, and a group left empty
/// shows no card. An empty ledger is treated as the file-order ledger, which is what a
/// session looks like before anything was reordered. Pure: the same inputs
/// always give the same cards.
pub fn flatten(documents: &[Document], ledger: &Ledger, collapsed: &CollapsedGroups) -> Vec<Card> {
    if ledger.is_empty() {
        let rebuilt = Ledger::rebuild_from_file_order(documents);
        return flatten_ledger(documents, &rebuilt, collapsed);
    }
    flatten_ledger(documents, ledger, collapsed)
}

fn flatten_ledger(documents: &[Document], ledger: &Ledger, collapsed: &CollapsedGroups) -> Vec<Card> {
    let files: HashMap<FileId, (usize, &Document)> = documents
        .iter()
        .enumerate()
        .map(|(index, doc)| (doc.id(), (index, doc)))
        .collect();

    let mut cards = Vec::with_capacity(ledger.len());
    for group in group_entries(ledger) {
        let Some(&(file_index, doc)) = files.get(&group.file_id) else {
            continue;
        };
        let pages: Vec<&Page> = group
            .page_ids
            .iter()
            .filter_map(|&id| doc.page(id))
            .filter(|page| page.is_live())
            .collect();
        if pages.is_empty() {
            continue;
        }

        if collapsed.contains(&group.id) {
            cards.push(Card::File(FileCard {
                flat_index: cards.len(),
                group_id: group.id,
                file_id: group.file_id,
                file_index,
                name: doc.name().to_string(),
                path: doc.path().to_path_buf(),
                group_page_count: pages.len(),
                first_page_id: pages[0].id(),
                group_page_ids: pages.iter().map(|page| page.id()).collect(),
                source_page_indices: pages.iter().map(|page| page.source_page_index()).collect(),
            }));
            continue;
        }

        for (position, page) in pages.iter().enumerate() {
            cards.push(Card::Page(PageCard {
                flat_index: cards.len(),
                group_id: group.id,
                file_id: group.file_id,
                file_index,
                name: doc.name().to_string(),
                path: doc.path().to_path_buf(),
                page_id: page.id(),
                source_page_index: page.source_page_index(),
                rotation: page.rotation(),
                is_first_of_group: position == 0,
                is_first_page: page.source_page_index() == 0,
            }));
        }
    }
    cards
}

/// Current groups in ledger order, holding only live pages. Groups with no
/// live page are left out.
///
/// Uses the same empty-ledger fallback as [`flatten`].
pub fn live_groups(documents: &[Document], ledger: &Ledger) -> Vec<Group> {
    let rebuilt;
    let ledger = if ledger.is_empty() {
        rebuilt = Ledger::rebuild_from_file_order(documents);
        &rebuilt
    } else {
        ledger
    };
    group_entries(ledger)
        .into_iter()
        .filter_map(|mut group| {
            let doc = find_document(documents, group.file_id)?;
            group
                .page_ids
                .retain(|&id| doc.page(id).is_some_and(Page::is_live));
            (!group.page_ids.is_empty()).then_some(group)
        })
        .collect()
}

/// Page ids in the order the cards show them.
pub fn displayed_page_ids(cards: &[Card]) -> Vec<PageId> {
    cards.iter().flat_map(|card| card.page_ids().iter().copied()).collect()
}

/// File ids in the order their first card appears.
pub fn displayed_file_ids(cards: &[Card]) -> Vec<FileId> {
    let mut seen = HashSet::new();
    cards
        .iter()
        .map(Card::file_id)
        .filter(|id| seen.insert(*id))
        .collect()
}
