//! Opaque session-scoped identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an imported source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(u64);

/// Identifier of one page of one source document.
///
/// Stable for the life of the session and independent of the page's
/// position in either its document or the merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(u64);

impl FileId {
    /// Wrap a raw id. Mostly useful in tests; real ids come from [`IdAllocator`].
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl PageId {
    /// Wrap a raw id. Mostly useful in tests; real ids come from [`IdAllocator`].
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file-{}", self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// Hands out ids that are unique across files and pages for one session.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Create an allocator starting at 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate a fresh file id.
    pub fn file_id(&mut self) -> FileId {
        FileId(self.bump())
    }

    /// Allocate a fresh page id.
    pub fn page_id(&mut self) -> PageId {
        PageId(self.bump())
    }

    fn bump(&mut self) -> u64 {
        // Default-constructed allocators start at 0; skip it so ids are never 0.
        if self.next == 0 {
            self.next = 1;
        }
        let id = self.next;
        self.next += 1;
        id
    }
}
