#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfstudio::Workspace;
use pdfstudio::edit::PdfEditor;
use pdfstudio::grouping::{displayed_page_ids, group_entries};
use pdfstudio::plan::Plan;
use pdfstudio::services::PdfInfo;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| Builder::new_current_thread().enable_all().build().unwrap())
}

fuzz_target!(|data: &[u8]| {
    let s = std::str::from_utf8(data).unwrap_or("");
    let Ok(plan) = Plan::from_json_str(s) else {
        return;
    };

    let mut workspace = Workspace::new();
    for (name, page_count) in [("a.pdf", 3), ("b.pdf", 1), ("c.pdf", 4)] {
        workspace.add_document(name, PdfInfo { page_count, title: None });
    }

    // Deferred edits never touch the editor, so no file is written.
    let _ = runtime().block_on(plan.apply(&mut workspace, &PdfEditor::new()));

    // Whatever the plan did, cards and groups still cover the ledger exactly.
    let ledger: Vec<_> = workspace.ledger().iter().map(|e| e.page_id).collect();
    let cards = workspace.cards();
    assert_eq!(displayed_page_ids(&cards), ledger);
    for (position, card) in cards.iter().enumerate() {
        assert_eq!(card.flat_index(), position);
    }
    let grouped: Vec<_> = group_entries(workspace.ledger())
        .into_iter()
        .flat_map(|group| group.page_ids)
        .collect();
    assert_eq!(grouped, ledger);
});
