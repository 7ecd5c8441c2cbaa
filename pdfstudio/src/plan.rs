//! Scripted session edits.
//!
//! A plan is a JSON array of steps replayed against a [`Workspace`] in
//! order. It is how a headless run performs the moves, deletions and
//! rotations a user would make by hand:
//!
//! ```json
//! [
//!   { "op": "moveFile", "file": 2, "before": { "file": 1, "page": 1 } },
//!   { "op": "deletePage", "page": { "file": 1, "page": 3 } },
//!   { "op": "rotate", "page": { "file": 2, "page": 1 }, "degrees": 90 },
//!   { "op": "collapse" }
//! ]
//! ```
//!
//! Files are addressed by their 1-based position among the documents loaded
//! when the plan starts; positions do not shift when a file is removed.
//! Pages are addressed by their 1-based page number in the source file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::drag::Clock;
use crate::error::{Result, StudioError};
use crate::model::{Document, FileId, PageId, Rotation};
use crate::services::PageEditor;
use crate::workspace::Workspace;

/// A page by file position and page number, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    /// Input position of the file.
    pub file: usize,
    /// Page number in the source file.
    pub page: usize,
}

/// One plan step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PlanStep {
    /// Move a whole file before `before` (end if absent).
    MoveFile {
        /// Input position.
        file: usize,
        /// Page to insert before.
        #[serde(default)]
        before: Option<PageRef>,
    },
    /// Move one page before `before` (end if absent).
    MovePage {
        /// Page to move.
        page: PageRef,
        /// Page to insert before.
        #[serde(default)]
        before: Option<PageRef>,
    },
    /// Soft-delete a page.
    DeletePage {
        /// Page to delete.
        page: PageRef,
    },
    /// Undo a soft delete.
    RestorePage {
        /// Page to restore.
        page: PageRef,
    },
    /// Rotate a page by a multiple of 90 degrees.
    Rotate {
        /// Page to rotate.
        page: PageRef,
        /// Clockwise degrees; negative turns counter-clockwise.
        degrees: i32,
    },
    /// Collapse the group holding `page`, or every group.
    Collapse {
        /// Any page of the group.
        #[serde(default)]
        page: Option<PageRef>,
    },
    /// Expand the group holding `page`, or every group.
    Expand {
        /// Any page of the group.
        #[serde(default)]
        page: Option<PageRef>,
    },
    /// Remove a file and all of its pages.
    RemoveFile {
        /// Input position.
        file: usize,
    },
}

/// Ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    /// Steps in application order.
    pub steps: Vec<PlanStep>,
}

/// What applying a plan did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    /// Steps applied.
    pub applied: usize,
    /// Steps that changed the session.
    pub changed: usize,
    /// Rotations that could not be saved to their file.
    pub persist_failures: Vec<(PathBuf, String)>,
}

impl Plan {
    /// Parse a plan from JSON text.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load a plan file.
    ///
    /// # Errors
    ///
    /// [`StudioError::FileNotFound`] if `path` is missing,
    /// [`StudioError::Json`] if it is not a valid plan.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StudioError::file_not_found(path),
            _ => StudioError::Io(e),
        })?;
        Self::from_json_str(&text).map_err(|source| StudioError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply every step to `workspace`, stopping at the first failure.
    ///
    /// Steps before the failing one stay applied.
    ///
    /// # Errors
    ///
    /// [`StudioError::InvalidPlan`] naming the 1-based step and the reason.
    pub async fn apply<C: Clock, E: PageEditor>(
        &self,
        workspace: &mut Workspace<C>,
        editor: &E,
    ) -> Result<PlanSummary> {
        let files: Vec<FileId> = workspace.documents().iter().map(Document::id).collect();
        let mut summary = PlanSummary::default();

        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            let changed = apply_step(workspace, &files, step, editor, &mut summary)
                .await
                .map_err(|err| StudioError::invalid_plan(number, err.to_string()))?;

            debug!(step = number, ?step, changed, "plan step applied");
            summary.applied += 1;
            if changed {
                summary.changed += 1;
            }
        }
        Ok(summary)
    }
}

async fn apply_step<C: Clock, E: PageEditor>(
    workspace: &mut Workspace<C>,
    files: &[FileId],
    step: &PlanStep,
    editor: &E,
    summary: &mut PlanSummary,
) -> Result<bool> {
    match *step {
        PlanStep::MoveFile { file, before } => {
            let file = file_at(files, file)?;
            let before = before.map(|target| page_at(workspace, files, target)).transpose()?;
            workspace.move_file(file, before)
        }
        PlanStep::MovePage { page, before } => {
            let page = page_at(workspace, files, page)?;
            let before = before.map(|target| page_at(workspace, files, target)).transpose()?;
            workspace.move_page(page, before)
        }
        PlanStep::DeletePage { page } => {
            let page = page_at(workspace, files, page)?;
            Ok(workspace.delete_page(page)? > 0)
        }
        PlanStep::RestorePage { page } => {
            let page = page_at(workspace, files, page)?;
            workspace.restore_page(page)
        }
        PlanStep::Rotate { page, degrees } => {
            let rotation = Rotation::from_degrees(degrees)?;
            let page = page_at(workspace, files, page)?;
            let outcome = workspace.rotate_page(page, rotation, editor).await?;
            let changed = !outcome.rotated.is_empty();
            summary.persist_failures.extend(outcome.persist_failures);
            Ok(changed)
        }
        PlanStep::Collapse { page } | PlanStep::Expand { page } => {
            let collapse = matches!(step, PlanStep::Collapse { .. });
            match page {
                Some(target) => {
                    let page = page_at(workspace, files, target)?;
                    let group = workspace.group_of(page).ok_or(StudioError::UnknownPage(page))?;
                    let was = workspace.collapsed().contains(&group);
                    workspace.set_collapsed(group, collapse);
                    Ok(was != collapse)
                }
                None if collapse => {
                    workspace.collapse_all();
                    Ok(true)
                }
                None => {
                    workspace.expand_all();
                    Ok(true)
                }
            }
        }
        PlanStep::RemoveFile { file } => {
            let file = file_at(files, file)?;
            workspace.remove_file(file)?;
            Ok(true)
        }
    }
}

fn file_at(files: &[FileId], position: usize) -> Result<FileId> {
    position
        .checked_sub(1)
        .and_then(|index| files.get(index).copied())
        .ok_or_else(|| {
            StudioError::other(format!(
                "no input file #{position} (files are numbered 1 to {})",
                files.len()
            ))
        })
}

fn page_at<C: Clock>(workspace: &Workspace<C>, files: &[FileId], target: PageRef) -> Result<PageId> {
    let file = file_at(files, target.file)?;
    let doc = workspace
        .document(file)
        .ok_or(StudioError::UnknownFile(file))?;
    target
        .page
        .checked_sub(1)
        .and_then(|index| doc.pages().get(index))
        .map(|page| page.id())
        .ok_or_else(|| {
            StudioError::other(format!(
                "{} has no page {} ({} page(s))",
                doc.name(),
                target.page,
                doc.page_count()
            ))
        })
}
