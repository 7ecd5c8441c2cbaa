//! Drag and drop resolution.
//!
//! A gesture goes `Idle -> Dragging -> Idle`. While dragging, the controller
//! tracks the hovered drop zone (by card `flat_index`); on drop it resolves
//! the zone to a target page and yields a [`DropCommand`] for the ledger.

mod hover;

pub use hover::{Clock, HoverIntent, ManualClock, SystemClock};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::grouping::Card;
use crate::ledger::Ledger;
use crate::model::{FileId, PageId};

/// Default delay before a drag-leave clears the drop target.
pub const DEFAULT_HOVER_DEBOUNCE: Duration = Duration::from_millis(50);

/// What is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum DragItem {
    /// A whole file (every ledger entry it owns).
    File(FileId),
    /// One page.
    Page(PageId),
}

/// Ledger mutation produced by a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropCommand {
    /// Move a file's entries before `target` (end if `None`).
    MoveFile {
        /// Dragged file.
        file: FileId,
        /// Page to insert before.
        target: Option<PageId>,
    },
    /// Move one page before `target` (end if `None`).
    MovePage {
        /// Dragged page.
        page: PageId,
        /// Page to insert before.
        target: Option<PageId>,
    },
    /// Nothing to do.
    NoOp,
}

impl DropCommand {
    /// Apply to `ledger`. Returns whether the ledger changed.
    pub fn apply(self, ledger: &mut Ledger) -> bool {
        match self {
            DropCommand::MoveFile { file, target } => ledger.move_file(file, target),
            DropCommand::MovePage { page, target } => ledger.move_page(page, target),
            DropCommand::NoOp => false,
        }
    }

    /// Whether this is [`DropCommand::NoOp`].
    pub fn is_noop(&self) -> bool {
        matches!(self, DropCommand::NoOp)
    }
}

/// Page a drop at `flat_index` inserts before. `None` means the end.
pub fn resolve_target(cards: &[Card], flat_index: usize) -> Option<PageId> {
    cards.get(flat_index).map(Card::anchor_page_id)
}

/// Turn a drop of `item` at `flat_index` into a ledger command.
///
/// Dropping a file onto any card of the same file does nothing.
pub fn resolve_drop(item: DragItem, cards: &[Card], flat_index: usize) -> DropCommand {
    let card = cards.get(flat_index);
    let target = card.map(Card::anchor_page_id);

    match item {
        DragItem::File(file) => {
            if card.is_some_and(|card| card.file_id() == file) {
                debug!(%file, flat_index, "file dropped onto its own card");
                return DropCommand::NoOp;
            }
            DropCommand::MoveFile { file, target }
        }
        DragItem::Page(page) => {
            if target == Some(page) {
                return DropCommand::NoOp;
            }
            DropCommand::MovePage { page, target }
        }
    }
}

/// Gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// No gesture.
    Idle,
    /// A gesture is in progress.
    Dragging {
        /// What is being dragged.
        item: DragItem,
        /// Card the gesture started on.
        origin: usize,
    },
}

/// Drag state machine with a debounced drop target.
#[derive(Debug)]
pub struct DragController<C: Clock = SystemClock> {
    clock: C,
    phase: DragPhase,
    hover: HoverIntent,
}

impl DragController<SystemClock> {
    /// Controller on the wall clock with the default debounce.
    pub fn new() -> Self {
        Self::with_clock(SystemClock, DEFAULT_HOVER_DEBOUNCE)
    }
}

impl Default for DragController<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> DragController<C> {
    /// Controller on a custom clock.
    pub fn with_clock(clock: C, debounce: Duration) -> Self {
        Self {
            clock,
            phase: DragPhase::Idle,
            hover: HoverIntent::new(debounce),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// Whether a gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// Begin dragging `item` from the card at `origin`.
    ///
    /// Starting while another gesture is active replaces it.
    pub fn start(&mut self, item: DragItem, origin: usize) {
        self.hover.reset();
        self.phase = DragPhase::Dragging { item, origin };
    }

    /// Pointer is over the drop zone in front of card `flat_index`.
    pub fn drag_over(&mut self, flat_index: usize) {
        if self.is_dragging() {
            self.hover.over(flat_index);
        }
    }

    /// Pointer left a drop zone.
    pub fn drag_leave(&mut self) {
        if self.is_dragging() {
            let now = self.clock.now();
            self.hover.leave(now);
        }
    }

    /// Current drop target, after applying any due clear.
    pub fn drop_target(&mut self) -> Option<usize> {
        if !self.is_dragging() {
            return None;
        }
        let now = self.clock.now();
        self.hover.target(now)
    }

    /// Drop at the tracked target.
    ///
    /// Without a target the gesture is cancelled. The controller is idle
    /// afterwards in every case.
    pub fn drop(&mut self, cards: &[Card]) -> DropCommand {
        match self.drop_target() {
            Some(flat_index) => self.drop_at(cards, flat_index),
            None => {
                self.cancel();
                DropCommand::NoOp
            }
        }
    }

    /// Drop at an explicit zone. The controller is idle afterwards.
    pub fn drop_at(&mut self, cards: &[Card], flat_index: usize) -> DropCommand {
        let phase = std::mem::replace(&mut self.phase, DragPhase::Idle);
        self.hover.reset();
        match phase {
            DragPhase::Dragging { item, .. } => resolve_drop(item, cards, flat_index),
            DragPhase::Idle => DropCommand::NoOp,
        }
    }

    /// Abort the gesture without a drop.
    pub fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
        self.hover.reset();
    }
}
