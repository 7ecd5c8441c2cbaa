//! The editing session.
//!
//! A [`Workspace`] owns every piece of session state: imported documents,
//! the merge-order ledger, collapse state, selection, the drag gesture and
//! the merge lifecycle. Views read [`Workspace::cards`]; user actions call
//! the mutators here. File bytes are only touched through the collaborator
//! traits in [`services`](crate::services).
//!
//! The ledger is kept populated for as long as any document has a live
//! page, so it is always the one source of output order.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, EditMode};
use crate::drag::{Clock, DragController, DragItem, DropCommand, SystemClock};
use crate::error::{Result, StudioError};
use crate::grouping::{
    Card, CollapsedGroups, GroupId, displayed_file_ids, displayed_page_ids, flatten, live_groups,
};
use crate::ledger::{Ledger, LedgerEntry};
use crate::model::{Document, FileId, IdAllocator, Page, PageId, Rotation, find_document};
use crate::request::{self, MergeRequest, RequestOptions};
use crate::selection::{Selection, SelectionKey, SelectionMode};
use crate::services::{
    MergeBackend, MergeOutcome, MergeProgress, MetadataSource, PageEditor, PageOperation, PdfInfo,
    ThumbnailRenderer,
};
use crate::thumbnail::{ThumbnailCache, ThumbnailHandle, ThumbnailKey};

/// Where the merge lifecycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStatus {
    /// No merge has run, or the state was reset.
    #[default]
    Idle,
    /// A merge is running.
    Merging,
    /// The last merge finished.
    Complete,
    /// The last merge failed.
    Error,
}

/// Merge status plus what the last run reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeState {
    /// Lifecycle status.
    pub status: MergeStatus,
    /// Latest progress report of the current or last run.
    pub progress: Option<MergeProgress>,
    /// Result of the last successful run.
    pub outcome: Option<MergeOutcome>,
    /// Reason the last run failed.
    pub error: Option<String>,
}

impl MergeState {
    /// Whether a merge is running.
    pub fn is_merging(&self) -> bool {
        self.status == MergeStatus::Merging
    }

    /// Progress in whole percent; 0 before the first report.
    pub fn percentage(&self) -> u8 {
        self.progress.map_or(0, |progress| progress.percentage())
    }

    fn fail(&mut self, error: &StudioError) {
        self.status = MergeStatus::Error;
        self.error = Some(error.to_string());
    }
}

/// What a rotation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationOutcome {
    /// Pages whose in-memory rotation changed.
    pub rotated: Vec<PageId>,
    /// Files the editor failed to update, with the reason.
    pub persist_failures: Vec<(PathBuf, String)>,
}

impl RotationOutcome {
    /// Whether every file edit succeeded (trivially true when none ran).
    pub fn is_persisted(&self) -> bool {
        self.persist_failures.is_empty()
    }
}

/// One editing session.
#[derive(Debug)]
pub struct Workspace<C: Clock = SystemClock> {
    ids: IdAllocator,
    documents: Vec<Document>,
    ledger: Ledger,
    collapsed: CollapsedGroups,
    selection: Selection,
    thumbnails: ThumbnailCache,
    drag: DragController<C>,
    merge_state: MergeState,
    edit_mode: EditMode,
    jobs: usize,
}

impl Workspace<SystemClock> {
    /// Empty session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Empty session configured by `config`.
    pub fn with_config(config: &Config) -> Self {
        Self::with_clock(SystemClock, config)
    }
}

impl Default for Workspace<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Workspace<C> {
    /// Empty session whose drag debounce runs on `clock`.
    pub fn with_clock(clock: C, config: &Config) -> Self {
        Self {
            ids: IdAllocator::new(),
            documents: Vec::new(),
            ledger: Ledger::new(),
            collapsed: CollapsedGroups::new(),
            selection: Selection::new(),
            thumbnails: ThumbnailCache::new(),
            drag: DragController::with_clock(clock, config.hover_debounce()),
            merge_state: MergeState::default(),
            edit_mode: config.edit_mode,
            jobs: config.effective_jobs().max(1),
        }
    }

    // ---- state ----

    /// Imported documents, in import order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Look up a document.
    pub fn document(&self, file: FileId) -> Option<&Document> {
        find_document(&self.documents, file)
    }

    /// Merge order.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Groups shown collapsed.
    pub fn collapsed(&self) -> &CollapsedGroups {
        &self.collapsed
    }

    /// Current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable selection, for plain toggles and mode switches.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Thumbnail cache.
    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    /// Drag gesture state.
    pub fn drag(&self) -> &DragController<C> {
        &self.drag
    }

    /// Merge lifecycle state.
    pub fn merge_state(&self) -> &MergeState {
        &self.merge_state
    }

    /// Whether edits are written to source files.
    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    /// Card list for the current state.
    pub fn cards(&self) -> Vec<Card> {
        flatten(&self.documents, &self.ledger, &self.collapsed)
    }

    // ---- import and removal ----

    /// Import `paths` and append their pages to the merge order.
    ///
    /// Never fails as a whole: a file whose metadata cannot be read is
    /// imported as a one-page document and a warning is logged. Returns the
    /// new ids in `paths` order.
    pub async fn import<M: MetadataSource>(&mut self, source: &M, paths: &[PathBuf]) -> Vec<FileId> {
        self.import_at(source, paths, None).await
    }

    /// Import `paths` and insert their pages before `before` (end if `None`
    /// or stale).
    pub async fn import_at<M: MetadataSource>(
        &mut self,
        source: &M,
        paths: &[PathBuf],
        before: Option<PageId>,
    ) -> Vec<FileId> {
        let infos = fetch_info(source, paths, self.jobs).await;

        let start = self.documents.len();
        for (path, info) in paths.iter().zip(infos) {
            let doc = Document::new(&mut self.ids, path.clone(), info.page_count, info.title);
            self.documents.push(doc);
        }

        let added = &self.documents[start..];
        self.ledger.insert_at(added, before);
        info!(
            files = added.len(),
            pages = added.iter().map(Document::page_count).sum::<usize>(),
            "imported files"
        );
        let ids = added.iter().map(Document::id).collect();
        self.forget_stale_groups();
        ids
    }

    /// Add a document whose metadata is already known, at the end.
    pub fn add_document(&mut self, path: impl Into<PathBuf>, info: PdfInfo) -> FileId {
        let doc = Document::new(&mut self.ids, path, info.page_count, info.title);
        let id = doc.id();
        self.ledger.append(&doc);
        self.documents.push(doc);
        id
    }

    /// Remove a document with all of its pages.
    ///
    /// # Errors
    ///
    /// [`StudioError::UnknownFile`] if no such document is loaded.
    pub fn remove_file(&mut self, file: FileId) -> Result<Document> {
        let index = self
            .documents
            .iter()
            .position(|doc| doc.id() == file)
            .ok_or(StudioError::UnknownFile(file))?;
        let doc = self.documents.remove(index);

        let removed = self.ledger.remove_file(file);
        let page_ids: HashSet<PageId> = doc.pages().iter().map(Page::id).collect();
        self.selection.remove(
            std::iter::once(SelectionKey::File(file))
                .chain(page_ids.iter().copied().map(SelectionKey::Page)),
        );
        self.collapsed
            .retain(|group| !page_ids.contains(&group.first_page()));
        self.thumbnails.invalidate_file(doc.path());

        debug!(%file, entries = removed, "file removed");
        Ok(doc)
    }

    // ---- page state ----

    /// Soft-delete one page.
    pub fn delete_page(&mut self, page: PageId) -> Result<usize> {
        self.delete_pages(&[page])
    }

    /// Soft-delete pages and drop them from the merge order.
    ///
    /// Validated as a whole before anything changes. Pages that are already
    /// deleted are skipped. Returns the number of pages deleted.
    ///
    /// # Errors
    ///
    /// - [`StudioError::UnknownPage`] for an id that belongs to no document
    /// - [`StudioError::LastPageDeletion`] if a document would be left
    ///   without a live page
    pub fn delete_pages(&mut self, pages: &[PageId]) -> Result<usize> {
        let mut per_doc: HashMap<usize, HashSet<PageId>> = HashMap::new();
        for &page in pages {
            let index = self.locate(page).ok_or(StudioError::UnknownPage(page))?;
            if self.documents[index].page(page).is_some_and(Page::is_live) {
                per_doc.entry(index).or_default().insert(page);
            }
        }

        for (&index, doomed) in &per_doc {
            let doc = &self.documents[index];
            if doc.live_page_count() <= doomed.len() {
                return Err(StudioError::LastPageDeletion {
                    file: doc.id(),
                    name: doc.name().to_string(),
                });
            }
        }

        let mut deleted = 0;
        for (index, doomed) in per_doc {
            let doc = &mut self.documents[index];
            for page in doomed {
                if let Some(record) = doc.page_mut(page) {
                    record.set_deleted(true);
                }
                self.ledger.remove_page(page);
                deleted += 1;
            }
        }
        self.selection.remove(pages.iter().copied());
        self.forget_stale_groups();

        debug!(deleted, "pages deleted");
        Ok(deleted)
    }

    /// Undo a soft delete.
    ///
    /// The page goes back before the next live page of the same file (by
    /// source index) that is in the merge order, else after the previous
    /// one, else at the end. Returns `false` if the page was not deleted.
    ///
    /// # Errors
    ///
    /// [`StudioError::UnknownPage`] for an id that belongs to no document.
    pub fn restore_page(&mut self, page: PageId) -> Result<bool> {
        let index = self.locate(page).ok_or(StudioError::UnknownPage(page))?;
        let doc = &self.documents[index];
        let record = doc.page(page).ok_or(StudioError::UnknownPage(page))?;
        if record.is_live() {
            return Ok(false);
        }

        let file = doc.id();
        let source_index = record.source_page_index();
        let ledger = &self.ledger;
        let placed = |sibling: &&Page| sibling.is_live() && ledger.contains(sibling.id());
        let next = doc.pages()[source_index + 1..]
            .iter()
            .find(placed)
            .map(Page::id);
        let prev = doc.pages()[..source_index]
            .iter()
            .rev()
            .find(placed)
            .map(Page::id);

        if let Some(record) = self.documents[index].page_mut(page) {
            record.set_deleted(false);
        }
        let entry = LedgerEntry::new(file, page);
        match (next, prev) {
            (Some(next), _) => self.ledger.insert_entry(entry, Some(next)),
            (None, Some(prev)) => self.ledger.insert_entry_after(entry, prev),
            (None, None) => self.ledger.insert_entry(entry, None),
        };
        self.forget_stale_groups();

        debug!(%page, "page restored");
        Ok(true)
    }

    /// Rotate one page by `delta`.
    pub async fn rotate_page<E: PageEditor>(
        &mut self,
        page: PageId,
        delta: Rotation,
        editor: &E,
    ) -> Result<RotationOutcome> {
        self.rotate_pages(&[page], delta, editor).await
    }

    /// Rotate pages by `delta`.
    ///
    /// In-memory rotation always changes and each page's thumbnail is
    /// dropped. In [`EditMode::InPlace`] the editor is then asked to rotate
    /// the pages in their files; a failure is logged and listed in the
    /// outcome but does not undo the in-memory change.
    ///
    /// # Errors
    ///
    /// [`StudioError::UnknownPage`] if an id is unknown or deleted. Nothing
    /// is rotated in that case.
    pub async fn rotate_pages<E: PageEditor>(
        &mut self,
        pages: &[PageId],
        delta: Rotation,
        editor: &E,
    ) -> Result<RotationOutcome> {
        let mut targets: Vec<(usize, PageId)> = Vec::with_capacity(pages.len());
        for &page in pages {
            let index = self.locate(page).ok_or(StudioError::UnknownPage(page))?;
            if !self.documents[index].page(page).is_some_and(Page::is_live) {
                return Err(StudioError::UnknownPage(page));
            }
            if !targets.iter().any(|&(_, seen)| seen == page) {
                targets.push((index, page));
            }
        }

        let mut outcome = RotationOutcome::default();
        if delta.is_upright() {
            return Ok(outcome);
        }

        let mut per_file: Vec<(PathBuf, Vec<usize>)> = Vec::new();
        for (index, page) in targets {
            let doc = &mut self.documents[index];
            let path = doc.path().to_path_buf();
            let Some(record) = doc.page_mut(page) else {
                continue;
            };
            record.rotate(delta);
            let source_index = record.source_page_index();

            self.thumbnails.invalidate(&path, source_index);
            outcome.rotated.push(page);
            match per_file.iter_mut().find(|(file, _)| *file == path) {
                Some((_, indices)) => indices.push(source_index),
                None => per_file.push((path, vec![source_index])),
            }
        }

        if self.edit_mode == EditMode::InPlace {
            for (path, indices) in per_file {
                let operation = PageOperation::Rotate {
                    pages: indices,
                    rotation: delta,
                };
                if let Err(err) = editor.apply(&path, &operation).await {
                    warn!(path = %path.display(), error = %err, "rotation was not saved to the file");
                    outcome.persist_failures.push((path, err.to_string()));
                }
            }
        }

        debug!(pages = outcome.rotated.len(), degrees = delta.as_degrees(), "pages rotated");
        Ok(outcome)
    }

    // ---- selection actions ----

    /// Select every displayed file and page, in file mode.
    pub fn select_all(&mut self) {
        let cards = self.cards();
        let files = displayed_file_ids(&cards).into_iter().map(SelectionKey::from);
        let pages = displayed_page_ids(&cards).into_iter().map(SelectionKey::from);

        self.selection.set_mode(SelectionMode::File);
        self.selection.select_all(files.chain(pages));
    }

    /// Extend the selection to `target` over the displayed order of the
    /// current mode.
    pub fn select_range(&mut self, target: impl Into<SelectionKey>) {
        let cards = self.cards();
        let displayed: Vec<SelectionKey> = match self.selection.mode() {
            SelectionMode::File => displayed_file_ids(&cards)
                .into_iter()
                .map(SelectionKey::from)
                .collect(),
            SelectionMode::Page => displayed_page_ids(&cards)
                .into_iter()
                .map(SelectionKey::from)
                .collect(),
        };
        self.selection.select_range(&displayed, target.into());
    }

    /// Toggle a file and its live pages together.
    pub fn toggle_file_selection(&mut self, file: FileId) -> Result<()> {
        let doc = self.document(file).ok_or(StudioError::UnknownFile(file))?;
        let pages: Vec<PageId> = doc.live_pages().map(Page::id).collect();
        self.selection.toggle_file_with_pages(file, &pages);
        Ok(())
    }

    /// Live pages the current selection covers, in display order.
    ///
    /// In file mode that is every live page of each selected file.
    pub fn selected_pages(&self) -> Vec<PageId> {
        match self.selection.mode() {
            SelectionMode::Page => displayed_page_ids(&self.cards())
                .into_iter()
                .filter(|&page| self.selection.is_selected(page))
                .collect(),
            SelectionMode::File => self
                .documents
                .iter()
                .filter(|doc| self.selection.is_selected(doc.id()))
                .flat_map(|doc| doc.live_pages().map(Page::id))
                .collect(),
        }
    }

    /// Delete what is selected, then clear the selection.
    ///
    /// File mode removes the selected files; page mode soft-deletes the
    /// selected pages. Returns how many files or pages went away.
    ///
    /// # Errors
    ///
    /// [`StudioError::LastPageDeletion`] in page mode; the selection is kept.
    pub fn delete_selected(&mut self) -> Result<usize> {
        let count = match self.selection.mode() {
            SelectionMode::File => {
                let files: Vec<FileId> = self
                    .selection
                    .files()
                    .filter(|&file| self.document(file).is_some())
                    .collect();
                for &file in &files {
                    self.remove_file(file)?;
                }
                files.len()
            }
            SelectionMode::Page => {
                let pages = self.selected_pages();
                self.delete_pages(&pages)?
            }
        };
        self.selection.clear();
        Ok(count)
    }

    /// Rotate every selected page (file mode: every live page of each
    /// selected file).
    pub async fn rotate_selected<E: PageEditor>(
        &mut self,
        delta: Rotation,
        editor: &E,
    ) -> Result<RotationOutcome> {
        let pages = self.selected_pages();
        self.rotate_pages(&pages, delta, editor).await
    }

    // ---- collapse ----

    /// Flip a group between collapsed and expanded. Returns whether it is
    /// now collapsed.
    pub fn toggle_collapse(&mut self, group: GroupId) -> bool {
        if self.collapsed.remove(&group) {
            false
        } else {
            self.collapsed.insert(group);
            true
        }
    }

    /// Collapse or expand one group.
    pub fn set_collapsed(&mut self, group: GroupId, collapsed: bool) {
        if collapsed {
            self.collapsed.insert(group);
        } else {
            self.collapsed.remove(&group);
        }
    }

    /// Group currently holding `page`, if the page is live and ordered.
    pub fn group_of(&self, page: PageId) -> Option<GroupId> {
        live_groups(&self.documents, &self.ledger)
            .into_iter()
            .find(|group| group.page_ids.contains(&page))
            .map(|group| group.id)
    }

    /// Collapse every current group.
    pub fn collapse_all(&mut self) {
        self.collapsed = live_groups(&self.documents, &self.ledger)
            .into_iter()
            .map(|group| group.id)
            .collect();
    }

    /// Expand every group.
    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    // ---- ordering ----

    /// Move a file's pages before `before` (end if `None` or stale).
    /// Returns whether the order changed.
    pub fn move_file(&mut self, file: FileId, before: Option<PageId>) -> Result<bool> {
        if self.document(file).is_none() {
            return Err(StudioError::UnknownFile(file));
        }
        let changed = self.ledger.move_file(file, before);
        if changed {
            self.forget_stale_groups();
        }
        Ok(changed)
    }

    /// Move one page before `before` (end if `None` or stale).
    /// Returns whether the order changed.
    pub fn move_page(&mut self, page: PageId, before: Option<PageId>) -> Result<bool> {
        if !self.ledger.contains(page) {
            return Err(StudioError::UnknownPage(page));
        }
        let changed = self.ledger.move_page(page, before);
        if changed {
            self.forget_stale_groups();
        }
        Ok(changed)
    }

    /// Begin dragging `item` from the card at `origin`.
    pub fn start_drag(&mut self, item: DragItem, origin: usize) {
        self.drag.start(item, origin);
    }

    /// Pointer entered the drop zone in front of card `flat_index`.
    pub fn drag_over(&mut self, flat_index: usize) {
        self.drag.drag_over(flat_index);
    }

    /// Pointer left a drop zone.
    pub fn drag_leave(&mut self) {
        self.drag.drag_leave();
    }

    /// Abort the gesture.
    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Drop at the tracked target. Returns whether the order changed.
    pub fn drop(&mut self) -> bool {
        let cards = self.cards();
        let command = self.drag.drop(&cards);
        self.apply_drop(command)
    }

    /// Drop at card `flat_index` (past the end appends). Returns whether the
    /// order changed.
    pub fn drop_at(&mut self, flat_index: usize) -> bool {
        let cards = self.cards();
        let command = self.drag.drop_at(&cards, flat_index);
        self.apply_drop(command)
    }

    /// Apply a resolved drop.
    pub fn apply_drop(&mut self, command: DropCommand) -> bool {
        let changed = command.apply(&mut self.ledger);
        if changed {
            self.forget_stale_groups();
        }
        debug!(?command, changed, "drop applied");
        changed
    }

    // ---- merge ----

    /// Segment list for the current order.
    ///
    /// # Errors
    ///
    /// [`StudioError::NothingToMerge`] if no live page is in the order.
    pub fn build_request(&self) -> Result<MergeRequest> {
        let options = RequestOptions {
            include_rotations: self.edit_mode.rotations_in_request(),
        };
        let request = request::build_with(&self.documents, &self.ledger, options);
        if request.is_empty() {
            return Err(StudioError::NothingToMerge);
        }
        Ok(request)
    }

    /// Merge the current order into `output`.
    pub async fn merge<B: MergeBackend>(&mut self, backend: &B, output: &Path) -> Result<MergeOutcome> {
        self.merge_with_progress(backend, output, |_| {}).await
    }

    /// [`merge`](Self::merge), also forwarding every progress report.
    ///
    /// An empty request fails before the backend is called. Either way the
    /// merge state ends in `Complete` or `Error`.
    pub async fn merge_with_progress<B, F>(
        &mut self,
        backend: &B,
        output: &Path,
        mut on_progress: F,
    ) -> Result<MergeOutcome>
    where
        B: MergeBackend,
        F: FnMut(MergeProgress) + Send,
    {
        self.merge_state = MergeState {
            status: MergeStatus::Merging,
            ..MergeState::default()
        };

        let request = match self.build_request() {
            Ok(request) => request,
            Err(err) => {
                self.merge_state.fail(&err);
                return Err(err);
            }
        };

        let state = &mut self.merge_state;
        let result = backend
            .merge(&request, output, &mut |progress: MergeProgress| {
                debug!(current = progress.current, total = progress.total, "merge progress");
                state.progress = Some(progress);
                on_progress(progress);
            })
            .await;

        match &result {
            Ok(outcome) => {
                self.merge_state.status = MergeStatus::Complete;
                self.merge_state.outcome = Some(outcome.clone());
            }
            Err(err) => self.merge_state.fail(err),
        }
        result
    }

    /// Forget the last merge.
    pub fn reset_merge_state(&mut self) {
        self.merge_state = MergeState::default();
    }

    // ---- thumbnails ----

    /// Thumbnail for a page at its current rotation, rendering if needed.
    pub async fn thumbnail<R: ThumbnailRenderer>(
        &mut self,
        page: PageId,
        renderer: &R,
    ) -> Result<ThumbnailHandle> {
        let index = self.locate(page).ok_or(StudioError::UnknownPage(page))?;
        let doc = &self.documents[index];
        let record = doc.page(page).ok_or(StudioError::UnknownPage(page))?;
        let rotation = record.rotation();
        let key = ThumbnailKey::new(doc.path(), record.source_page_index(), rotation);

        let handle = self.thumbnails.get_or_render(renderer, key).await?;

        if let Some(record) = self.documents[index].page_mut(page) {
            if record.rotation() == rotation {
                record.set_thumbnail(handle.clone());
            }
        }
        Ok(handle)
    }

    /// Drop collapse state for groups that no longer exist, so a group
    /// that forms again later starts expanded.
    fn forget_stale_groups(&mut self) {
        if self.collapsed.is_empty() {
            return;
        }
        let current: HashSet<GroupId> = live_groups(&self.documents, &self.ledger)
            .into_iter()
            .map(|group| group.id)
            .collect();
        let before = self.collapsed.len();
        self.collapsed.retain(|group| current.contains(group));
        if self.collapsed.len() < before {
            debug!(dropped = before - self.collapsed.len(), "stale collapse state dropped");
        }
    }

    fn locate(&self, page: PageId) -> Option<usize> {
        self.documents.iter().position(|doc| doc.page(page).is_some())
    }
}

async fn fetch_info<M: MetadataSource>(source: &M, paths: &[PathBuf], jobs: usize) -> Vec<PdfInfo> {
    let tasks = paths.iter().cloned().enumerate().map(|(idx, path)| async move {
        let info = match source.pdf_info(&path).await {
            Ok(info) => info,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "metadata lookup failed, assuming one page");
                PdfInfo {
                    page_count: 1,
                    title: None,
                }
            }
        };
        (idx, info)
    });

    let mut indexed: Vec<(usize, PdfInfo)> = stream::iter(tasks)
        .buffer_unordered(jobs.max(1))
        .collect()
        .await;
    indexed.sort_by_key(|(idx, _)| *idx);
    indexed.into_iter().map(|(_, info)| info).collect()
}
