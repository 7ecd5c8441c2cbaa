//! Properties of flatten, the ledger and the request builder over random
//! arrangements.

use pdfstudio::Workspace;
use pdfstudio::grouping::{Card, displayed_page_ids, flatten, group_entries, live_groups};
use pdfstudio::ledger::Ledger;
use pdfstudio::model::PageId;
use pdfstudio::request;
use proptest::prelude::*;
use std::collections::HashSet;

use crate::common::workspace_with;

/// Page counts, page moves `(page, before)` as indices into all pages
/// (`before` past the end means append), pages to try deleting, and a
/// collapse bit per group.
type Arrangement = (Vec<usize>, Vec<(usize, usize)>, Vec<usize>, Vec<bool>);

fn arrangement() -> impl Strategy<Value = Arrangement> {
    prop::collection::vec(1usize..5, 1..5).prop_flat_map(|counts| {
        let total: usize = counts.iter().sum();
        (
            Just(counts),
            prop::collection::vec((0..total, 0..=total), 0..12),
            prop::collection::vec(0..total, 0..4),
            prop::collection::vec(any::<bool>(), total),
        )
    })
}

fn arrange((counts, moves, deletes, collapse): &Arrangement) -> Workspace {
    let (mut workspace, _) = workspace_with(counts);
    let pages: Vec<PageId> = workspace
        .documents()
        .iter()
        .flat_map(|doc| doc.pages().iter().map(|page| page.id()))
        .collect();

    for &(from, before) in moves {
        workspace
            .move_page(pages[from], pages.get(before).copied())
            .unwrap();
    }
    for &index in deletes {
        // Deleting a file's last page is refused; that is fine here.
        let _ = workspace.delete_page(pages[index]);
    }
    let groups = live_groups(workspace.documents(), workspace.ledger());
    for (group, &collapsed) in groups.iter().zip(collapse) {
        workspace.set_collapsed(group.id, collapsed);
    }
    workspace
}

proptest! {
    #[test]
    fn prop_flatten_is_idempotent(input in arrangement()) {
        let workspace = arrange(&input);
        prop_assert_eq!(workspace.cards(), workspace.cards());
    }

    #[test]
    fn prop_groups_partition_the_ledger(input in arrangement()) {
        let workspace = arrange(&input);
        let ledger_pages: Vec<PageId> = workspace.ledger().iter().map(|e| e.page_id).collect();

        let grouped: Vec<PageId> = group_entries(workspace.ledger())
            .into_iter()
            .flat_map(|group| group.page_ids)
            .collect();
        prop_assert_eq!(&grouped, &ledger_pages);
        prop_assert_eq!(displayed_page_ids(&workspace.cards()), ledger_pages);
    }

    #[test]
    fn prop_flat_index_is_contiguous(input in arrangement()) {
        let workspace = arrange(&input);
        for (position, card) in workspace.cards().iter().enumerate() {
            prop_assert_eq!(card.flat_index(), position);
        }
    }

    #[test]
    fn prop_card_count_matches_collapse_state(input in arrangement()) {
        let workspace = arrange(&input);
        let expected: usize = live_groups(workspace.documents(), workspace.ledger())
            .iter()
            .map(|group| {
                if workspace.collapsed().contains(&group.id) { 1 } else { group.page_ids.len() }
            })
            .sum();
        prop_assert_eq!(workspace.cards().len(), expected);
    }

    #[test]
    fn prop_rebuild_matches_empty_ledger(counts in prop::collection::vec(1usize..6, 1..6), collapse_first in any::<bool>()) {
        let (workspace, _) = workspace_with(&counts);
        let docs = workspace.documents();
        let mut collapsed = HashSet::new();
        if collapse_first {
            if let Some(group) = live_groups(docs, &Ledger::new()).first() {
                collapsed.insert(group.id);
            }
        }

        let rebuilt = Ledger::rebuild_from_file_order(docs);
        prop_assert_eq!(&rebuilt, workspace.ledger());
        prop_assert_eq!(
            flatten(docs, &rebuilt, &collapsed),
            flatten(docs, &Ledger::new(), &collapsed)
        );
    }

    #[test]
    fn prop_request_follows_ledger(input in arrangement()) {
        let workspace = arrange(&input);
        let built = request::build(workspace.documents(), workspace.ledger());

        let from_request: Vec<(String, usize)> = built
            .files
            .iter()
            .flat_map(|segment| {
                let path = segment.path.to_string_lossy().into_owned();
                segment.pages.clone().unwrap_or_default().into_iter().map(move |i| (path.clone(), i))
            })
            .collect();
        let from_ledger: Vec<(String, usize)> = workspace
            .ledger()
            .iter()
            .map(|entry| {
                let doc = workspace.document(entry.file_id).unwrap();
                let page = doc.page(entry.page_id).unwrap();
                (doc.path().to_string_lossy().into_owned(), page.source_page_index())
            })
            .collect();
        prop_assert_eq!(from_request, from_ledger);

        for pair in built.files.windows(2) {
            prop_assert_ne!(&pair[0].path, &pair[1].path);
        }
        prop_assert_eq!(built.len(), group_entries(workspace.ledger()).len());
    }

    #[test]
    fn prop_move_file_before_successor_is_noop(counts in prop::collection::vec(1usize..5, 2..5)) {
        let (mut workspace, files) = workspace_with(&counts);
        let before = workspace.ledger().clone();

        for (i, &file) in files.iter().enumerate() {
            let successor = files
                .get(i + 1)
                .map(|&next| workspace.document(next).unwrap().pages()[0].id());
            prop_assert!(!workspace.move_file(file, successor).unwrap());
        }
        prop_assert_eq!(workspace.ledger(), &before);
    }

    #[test]
    fn prop_collapsed_cards_anchor_on_first_page(input in arrangement()) {
        let workspace = arrange(&input);
        for card in workspace.cards() {
            if let Card::File(file) = &card {
                prop_assert_eq!(Some(&file.first_page_id), file.group_page_ids.first());
                prop_assert_eq!(file.group_page_count, file.group_page_ids.len());
            }
        }
    }
}
