//! Building the merge request handed to the merge backend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::ledger::Ledger;
use crate::model::{Document, FileId, Page, Rotation};

/// One segment: a file and the pages to copy from it, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    /// Source file.
    pub path: PathBuf,
    /// 0-based source page indices. `None` means every page in file order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<usize>>,
    /// Rotation to add to each listed page, parallel to `pages`. Only present
    /// when rotations travel with the request instead of being written into
    /// the source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotations: Option<Vec<Rotation>>,
}

impl FilePayload {
    /// Segment copying every page of `path`.
    pub fn whole_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pages: None,
            rotations: None,
        }
    }

    /// Segment copying the given pages of `path`.
    pub fn with_pages(path: impl Into<PathBuf>, pages: Vec<usize>) -> Self {
        Self {
            path: path.into(),
            pages: Some(pages),
            rotations: None,
        }
    }

    /// Rotation for the `position`-th page of this segment.
    pub fn rotation_at(&self, position: usize) -> Rotation {
        self.rotations
            .as_ref()
            .and_then(|rotations| rotations.get(position).copied())
            .unwrap_or_default()
    }

    fn push(&mut self, page: &Page, with_rotation: bool) {
        self.pages
            .get_or_insert_with(Vec::new)
            .push(page.source_page_index());
        if with_rotation {
            self.rotations
                .get_or_insert_with(Vec::new)
                .push(page.rotation());
        }
    }

    fn finish(mut self) -> Self {
        if self
            .rotations
            .as_ref()
            .is_some_and(|rotations| rotations.iter().all(|r| r.is_upright()))
        {
            self.rotations = None;
        }
        self
    }
}

/// Ordered segment list consumed by a [`MergeBackend`](crate::services::MergeBackend).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Segments in output order.
    pub files: Vec<FilePayload>,
}

impl MergeRequest {
    /// Whether there is nothing to merge.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Pages in the output, if every segment lists its pages.
    pub fn total_pages(&self) -> Option<usize> {
        self.files
            .iter()
            .map(|file| file.pages.as_ref().map(Vec::len))
            .sum()
    }
}

/// How the request is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Carry page rotations in the request.
    pub include_rotations: bool,
}

/// Build the segment list for the current order.
///
/// Consecutive ledger entries from the same file share a segment; a file
/// that shows up in several separated runs gets one segment per run. With an
/// empty ledger every document contributes one segment of its live pages, in
/// document order, and documents with no live pages contribute nothing.
/// Entries whose page is no longer live are skipped.
pub fn build(documents: &[Document], ledger: &Ledger) -> MergeRequest {
    build_with(documents, ledger, RequestOptions::default())
}

/// [`build`] with explicit options.
pub fn build_with(documents: &[Document], ledger: &Ledger, options: RequestOptions) -> MergeRequest {
    let with_rotation = options.include_rotations;

    if ledger.is_empty() {
        let files = documents
            .iter()
            .filter_map(|doc| {
                let mut payload = FilePayload::with_pages(doc.path(), Vec::new());
                for page in doc.live_pages() {
                    payload.push(page, with_rotation);
                }
                payload
                    .pages
                    .as_ref()
                    .is_some_and(|pages| !pages.is_empty())
                    .then(|| payload.finish())
            })
            .collect();
        return MergeRequest { files };
    }

    let by_id: HashMap<FileId, &Document> = documents.iter().map(|doc| (doc.id(), doc)).collect();
    let mut files: Vec<FilePayload> = Vec::new();
    let mut current: Option<(FileId, FilePayload)> = None;

    for entry in ledger {
        let Some(doc) = by_id.get(&entry.file_id) else {
            continue;
        };
        let Some(page) = doc.page(entry.page_id).filter(|page| page.is_live()) else {
            continue;
        };

        match current.as_mut() {
            Some((file, payload)) if *file == entry.file_id => {
                payload.push(page, with_rotation);
                continue;
            }
            _ => {}
        }

        if let Some((_, done)) = current.take() {
            files.push(done.finish());
        }
        let mut payload = FilePayload::with_pages(doc.path(), Vec::new());
        payload.push(page, with_rotation);
        current = Some((entry.file_id, payload));
    }
    if let Some((_, done)) = current {
        files.push(done.finish());
    }

    MergeRequest { files }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerEntry;
    use crate::model::IdAllocator;
    use std::path::Path;

    fn docs(counts: &[usize]) -> Vec<Document> {
        let mut ids = IdAllocator::new();
        counts
            .iter()
            .enumerate()
            .map(|(i, &n)| Document::new(&mut ids, format!("file{i}.pdf"), n, None))
            .collect()
    }

    fn entry(doc: &Document, index: usize) -> LedgerEntry {
        LedgerEntry::new(doc.id(), doc.pages()[index].id())
    }

    fn shape(request: &MergeRequest) -> Vec<(&Path, Vec<usize>)> {
        request
            .files
            .iter()
            .map(|f| (f.path.as_path(), f.pages.clone().unwrap_or_default()))
            .collect()
    }

    #[test]
    fn test_empty_ledger_one_segment_per_document() {
        let docs = docs(&[3, 2]);
        let request = build(&docs, &Ledger::new());

        assert_eq!(
            shape(&request),
            vec![
                (Path::new("file0.pdf"), vec![0, 1, 2]),
                (Path::new("file1.pdf"), vec![0, 1]),
            ]
        );
        assert_eq!(request.total_pages(), Some(5));
    }

    #[test]
    fn test_interleaved_runs_are_not_merged() {
        let docs = docs(&[2, 1]);
        let (a, b) = (&docs[0], &docs[1]);
        let ledger: Ledger = [entry(a, 0), entry(b, 0), entry(a, 1)].into_iter().collect();

        let request = build(&docs, &ledger);

        assert_eq!(
            shape(&request),
            vec![
                (Path::new("file0.pdf"), vec![0]),
                (Path::new("file1.pdf"), vec![0]),
                (Path::new("file0.pdf"), vec![1]),
            ]
        );
    }

    #[test]
    fn test_consecutive_entries_coalesce_in_ledger_order() {
        let docs = docs(&[3, 3]);
        let (a, b) = (&docs[0], &docs[1]);
        let ledger: Ledger = [
            entry(b, 0),
            entry(a, 2),
            entry(a, 0),
            entry(a, 1),
            entry(b, 1),
            entry(b, 2),
        ]
        .into_iter()
        .collect();

        let request = build(&docs, &ledger);
        assert_eq!(
            shape(&request),
            vec![
                (Path::new("file1.pdf"), vec![0]),
                (Path::new("file0.pdf"), vec![2, 0, 1]),
                (Path::new("file1.pdf"), vec![1, 2]),
            ]
        );
    }

    #[test]
    fn test_deleted_pages_are_skipped() {
        let mut docs = docs(&[3]);
        let ledger = Ledger::rebuild_from_file_order(&docs);
        let middle = docs[0].pages()[1].id();
        docs[0].page_mut(middle).unwrap().set_deleted(true);

        assert_eq!(
            shape(&build(&docs, &ledger)),
            vec![(Path::new("file0.pdf"), vec![0, 2])]
        );
        assert_eq!(
            shape(&build(&docs, &Ledger::new())),
            vec![(Path::new("file0.pdf"), vec![0, 2])]
        );
    }

    #[test]
    fn test_document_without_live_pages_emits_nothing() {
        let mut docs = docs(&[1]);
        let only = docs[0].pages()[0].id();
        docs[0].page_mut(only).unwrap().set_deleted(true);

        assert!(build(&docs, &Ledger::new()).is_empty());
    }

    #[test]
    fn test_stale_entries_between_runs_do_not_split_segment() {
        let docs = docs(&[2, 1]);
        let (a, b) = (&docs[0], &docs[1]);
        let ledger: Ledger = [entry(a, 0), entry(b, 0), entry(a, 1)].into_iter().collect();

        let request = build(std::slice::from_ref(a), &ledger);
        assert_eq!(shape(&request), vec![(Path::new("file0.pdf"), vec![0, 1])]);
    }

    #[test]
    fn test_rotations_only_when_requested_and_non_trivial() {
        let mut docs = docs(&[2, 1]);
        let first = docs[0].pages()[0].id();
        docs[0].page_mut(first).unwrap().rotate(Rotation::Deg90);
        let ledger = Ledger::rebuild_from_file_order(&docs);

        let plain = build(&docs, &ledger);
        assert!(plain.files.iter().all(|f| f.rotations.is_none()));

        let rotated = build_with(
            &docs,
            &ledger,
            RequestOptions {
                include_rotations: true,
            },
        );
        assert_eq!(
            rotated.files[0].rotations,
            Some(vec![Rotation::Deg90, Rotation::Deg0])
        );
        assert_eq!(rotated.files[0].rotation_at(0), Rotation::Deg90);
        assert_eq!(rotated.files[1].rotations, None);
        assert_eq!(rotated.files[1].rotation_at(0), Rotation::Deg0);
    }

    #[test]
    fn test_request_json_shape() {
        let request = MergeRequest {
            files: vec![
                FilePayload::with_pages("a.pdf", vec![0, 2]),
                FilePayload::whole_file("b.pdf"),
            ],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "files": [
                    {"path": "a.pdf", "pages": [0, 2]},
                    {"path": "b.pdf"}
                ]
            })
        );
        assert_eq!(request.total_pages(), None);
    }
}
