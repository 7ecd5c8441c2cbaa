//! Ordering scenarios driven through the public session API.

use pdfstudio::drag::DragItem;
use pdfstudio::grouping::{Card, flatten, group_entries};
use pdfstudio::ledger::{Ledger, LedgerEntry};
use pdfstudio::request::{self, FilePayload};
use pdfstudio::selection::SelectionMode;
use pdfstudio::{StudioError, Workspace};
use std::collections::HashSet;

use crate::common::{order, page, workspace_with};

#[test]
fn test_basic_append() {
    let (workspace, _) = workspace_with(&[3, 2]);

    let request = workspace.build_request().unwrap();

    assert_eq!(
        request.files,
        vec![
            FilePayload::with_pages("/docs/A.pdf", vec![0, 1, 2]),
            FilePayload::with_pages("/docs/B.pdf", vec![0, 1]),
        ]
    );
    assert_eq!(request.total_pages(), Some(5));
}

#[test]
fn test_page_delete_cascades() {
    let (mut workspace, files) = workspace_with(&[3]);

    workspace.delete_page(page(&workspace, files[0], 1)).unwrap();

    assert_eq!(order(&workspace), ["A0", "A2"]);
    let cards = workspace.cards();
    assert_eq!(cards.len(), 2);
    assert!(cards.iter().all(|card| !card.is_collapsed()));
    assert_eq!(
        workspace.build_request().unwrap().files[0].pages,
        Some(vec![0, 2])
    );
}

#[test]
fn test_collapse_expand_boundary() {
    let (mut workspace, files) = workspace_with(&[3]);
    let pages: Vec<_> = (0..3).map(|i| page(&workspace, files[0], i)).collect();

    workspace.collapse_all();
    let cards = workspace.cards();
    assert_eq!(cards.len(), 1);
    let Card::File(file_card) = &cards[0] else {
        panic!("expected a collapsed card");
    };
    assert_eq!(file_card.group_page_count, 3);
    assert_eq!(file_card.group_page_ids, pages);

    workspace.expand_all();
    let first_of_group: Vec<bool> = workspace
        .cards()
        .iter()
        .map(|card| match card {
            Card::Page(page) => page.is_first_of_group,
            Card::File(_) => panic!("expected page cards"),
        })
        .collect();
    assert_eq!(first_of_group, [true, false, false]);
}

#[test]
fn test_drag_file_onto_own_page() {
    let (mut workspace, files) = workspace_with(&[3, 2]);
    let before = workspace.ledger().clone();

    for target in 0..3 {
        workspace.start_drag(DragItem::File(files[0]), 0);
        assert!(!workspace.drop_at(target));
    }

    assert_eq!(workspace.ledger(), &before);
}

#[test]
fn test_split_and_rejoin_groups() {
    let (mut workspace, files) = workspace_with(&[3, 3]);
    let (a, b) = (files[0], files[1]);

    // [B0, A0, A1, A2, B1, B2]
    workspace
        .move_page(page(&workspace, b, 0), Some(page(&workspace, a, 0)))
        .unwrap();
    assert_eq!(order(&workspace), ["B0", "A0", "A1", "A2", "B1", "B2"]);

    let groups = group_entries(workspace.ledger());
    let shape: Vec<_> = groups
        .iter()
        .map(|group| (group.file_id, group.page_ids.len()))
        .collect();
    assert_eq!(shape, [(b, 1), (a, 3), (b, 2)]);

    let request = workspace.build_request().unwrap();
    let segments: Vec<_> = request
        .files
        .iter()
        .map(|segment| (segment.path.to_string_lossy().into_owned(), segment.pages.clone()))
        .collect();
    assert_eq!(
        segments,
        [
            ("/docs/B.pdf".to_string(), Some(vec![0])),
            ("/docs/A.pdf".to_string(), Some(vec![0, 1, 2])),
            ("/docs/B.pdf".to_string(), Some(vec![1, 2])),
        ]
    );

    // Sending A's pages to the end rejoins the two B runs.
    workspace
        .move_page(page(&workspace, a, 0), None)
        .unwrap();
    workspace
        .move_page(page(&workspace, a, 1), None)
        .unwrap();
    workspace
        .move_page(page(&workspace, a, 2), None)
        .unwrap();
    assert_eq!(order(&workspace), ["B0", "B1", "B2", "A0", "A1", "A2"]);
    assert_eq!(workspace.build_request().unwrap().len(), 2);
}

#[test]
fn test_builder_coalescing() {
    let (workspace, files) = workspace_with(&[2, 1]);
    let (a, b) = (files[0], files[1]);

    let mut ledger = Ledger::new();
    for (file, index) in [(a, 0), (b, 0), (a, 1)] {
        ledger.insert_entry(LedgerEntry::new(file, page(&workspace, file, index)), None);
    }

    let built = request::build(workspace.documents(), &ledger);
    assert_eq!(
        built.files,
        vec![
            FilePayload::with_pages("/docs/A.pdf", vec![0]),
            FilePayload::with_pages("/docs/B.pdf", vec![0]),
            FilePayload::with_pages("/docs/A.pdf", vec![1]),
        ]
    );
}

#[test]
fn test_move_file_before_its_successor_is_noop() {
    let (mut workspace, files) = workspace_with(&[2, 2, 1]);
    let before = workspace.ledger().clone();

    let next_first = page(&workspace, files[1], 0);
    assert!(!workspace.move_file(files[0], Some(next_first)).unwrap());
    assert!(!workspace.move_file(files[2], None).unwrap());

    assert_eq!(workspace.ledger(), &before);
}

#[test]
fn test_stale_target_appends() {
    let (mut workspace, files) = workspace_with(&[2, 2]);
    let target = page(&workspace, files[1], 0);
    workspace.start_drag(DragItem::File(files[0]), 0);

    // Target deleted between drag start and drop.
    workspace.delete_page(target).unwrap();
    assert!(workspace.move_file(files[0], Some(target)).unwrap());
    workspace.cancel_drag();

    assert_eq!(order(&workspace), ["B1", "A0", "A1"]);
}

#[test]
fn test_collapsed_drop_goes_before_first_page() {
    let (mut workspace, files) = workspace_with(&[2, 3]);
    let b_group = workspace.group_of(page(&workspace, files[1], 0)).unwrap();
    workspace.set_collapsed(b_group, true);
    // [A0] [A1] [B (collapsed)]
    assert_eq!(workspace.cards().len(), 3);

    workspace.start_drag(DragItem::Page(page(&workspace, files[0], 0)), 0);
    workspace.drag_over(2);
    assert!(workspace.drop());

    assert_eq!(order(&workspace), ["A1", "A0", "B0", "B1", "B2"]);
}

#[test]
fn test_cancelled_drag_leaves_no_target() {
    let (mut workspace, files) = workspace_with(&[1, 1]);
    let before = workspace.ledger().clone();

    workspace.start_drag(DragItem::File(files[0]), 0);
    workspace.drag_over(2);
    workspace.cancel_drag();

    assert!(!workspace.drag().is_dragging());
    assert!(!workspace.drop());
    assert_eq!(workspace.ledger(), &before);
}

#[test]
fn test_range_selection_uses_display_order() {
    let (mut workspace, files) = workspace_with(&[2, 2]);
    workspace
        .move_file(files[1], Some(page(&workspace, files[0], 0)))
        .unwrap();
    // Display: B0 B1 A0 A1
    workspace.selection_mut().set_mode(SelectionMode::Page);
    workspace.select_range(page(&workspace, files[1], 1));
    workspace.select_range(page(&workspace, files[0], 0));

    let selected: HashSet<_> = workspace.selection().pages().collect();
    let expected: HashSet<_> = [page(&workspace, files[1], 1), page(&workspace, files[0], 0)]
        .into_iter()
        .collect();
    assert_eq!(selected, expected);
}

#[test]
fn test_delete_all_pages_rejected() {
    let (mut workspace, files) = workspace_with(&[2]);
    let pages = [page(&workspace, files[0], 0), page(&workspace, files[0], 1)];
    let before = workspace.ledger().clone();

    let result = workspace.delete_pages(&pages);

    assert!(matches!(result, Err(StudioError::LastPageDeletion { .. })));
    assert_eq!(workspace.ledger(), &before);
}

#[test]
fn test_restore_round_trip() {
    let (mut workspace, files) = workspace_with(&[4]);
    let doomed = [page(&workspace, files[0], 1), page(&workspace, files[0], 2)];
    workspace.delete_pages(&doomed).unwrap();

    workspace.restore_page(doomed[1]).unwrap();
    workspace.restore_page(doomed[0]).unwrap();

    assert_eq!(order(&workspace), ["A0", "A1", "A2", "A3"]);
}

#[test]
fn test_empty_ledger_flatten_matches_rebuild() {
    let (workspace, _) = workspace_with(&[2, 3]);
    let collapsed = HashSet::new();

    let rebuilt = Ledger::rebuild_from_file_order(workspace.documents());
    assert_eq!(
        flatten(workspace.documents(), &Ledger::new(), &collapsed),
        flatten(workspace.documents(), &rebuilt, &collapsed)
    );
}

#[test]
fn test_empty_session_has_nothing_to_merge() {
    let workspace = Workspace::new();
    assert!(matches!(
        workspace.build_request(),
        Err(StudioError::NothingToMerge)
    ));
}
