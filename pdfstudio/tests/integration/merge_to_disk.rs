//! End-to-end runs: import real files, arrange, merge to disk.

use pdfstudio::config::{Config, EditMode};
use pdfstudio::edit::PdfEditor;
use pdfstudio::io::PdfReader;
use pdfstudio::merge::PdfMerger;
use pdfstudio::model::Rotation;
use pdfstudio::plan::Plan;
use pdfstudio::services::MergeProgress;
use pdfstudio::{MergeStatus, StudioError, Workspace};
use std::fs;
use tempfile::TempDir;

use crate::common::{page, page_rotations, page_tags, write_pdf};

#[tokio::test]
async fn test_import_arrange_merge() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a", 3);
    let b = write_pdf(dir.path(), "b", 2);
    let output = dir.path().join("out").join("merged.pdf");

    let mut workspace = Workspace::new();
    let files = workspace.import(&PdfReader::new(), &[a, b]).await;
    assert_eq!(workspace.ledger().len(), 5);

    // b0 first, drop a1, interleave b1 between a0 and a2.
    workspace
        .move_page(page(&workspace, files[1], 0), Some(page(&workspace, files[0], 0)))
        .unwrap();
    workspace.delete_page(page(&workspace, files[0], 1)).unwrap();
    workspace
        .move_page(page(&workspace, files[1], 1), Some(page(&workspace, files[0], 2)))
        .unwrap();

    let mut reports = Vec::new();
    let outcome = workspace
        .merge_with_progress(&PdfMerger::new(), &output, |p: MergeProgress| reports.push(p))
        .await
        .unwrap();

    assert_eq!(outcome.total_pages, 4);
    assert_eq!(page_tags(&output), ["b-0", "a-0", "b-1", "a-2"]);
    assert_eq!(
        reports.iter().map(|p| p.current).collect::<Vec<_>>(),
        [1, 2, 3, 4]
    );
    assert_eq!(workspace.merge_state().status, MergeStatus::Complete);
}

#[tokio::test]
async fn test_deferred_rotation_leaves_source_untouched() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a", 2);
    let source_bytes = fs::read(&a).unwrap();
    let output = dir.path().join("merged.pdf");

    let mut workspace = Workspace::new();
    let files = workspace.import(&PdfReader::new(), &[a.clone()]).await;
    let outcome = workspace
        .rotate_page(page(&workspace, files[0], 1), Rotation::CLOCKWISE, &PdfEditor::new())
        .await
        .unwrap();
    assert!(outcome.is_persisted());

    workspace.merge(&PdfMerger::new(), &output).await.unwrap();

    assert_eq!(fs::read(&a).unwrap(), source_bytes);
    assert_eq!(page_rotations(&output), [0, 90]);
}

#[tokio::test]
async fn test_in_place_rotation_is_written_to_source() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a", 2);
    let output = dir.path().join("merged.pdf");
    let config = Config {
        edit_mode: EditMode::InPlace,
        ..Config::default()
    };

    let mut workspace = Workspace::with_config(&config);
    let files = workspace.import(&PdfReader::new(), &[a.clone()]).await;
    workspace
        .rotate_page(
            page(&workspace, files[0], 0),
            Rotation::COUNTER_CLOCKWISE,
            &PdfEditor::new(),
        )
        .await
        .unwrap();

    assert_eq!(page_rotations(&a), [270, 0]);

    // The merge must not rotate a second time.
    workspace.merge(&PdfMerger::new(), &output).await.unwrap();
    assert_eq!(page_rotations(&output), [270, 0]);
}

#[tokio::test]
async fn test_unreadable_file_imports_as_one_page() {
    let dir = TempDir::new().unwrap();
    let good = write_pdf(dir.path(), "good", 2);
    let broken = dir.path().join("broken.pdf");
    fs::write(&broken, b"not a pdf").unwrap();

    let mut workspace = Workspace::new();
    let files = workspace.import(&PdfReader::new(), &[broken, good]).await;

    assert_eq!(workspace.document(files[0]).unwrap().page_count(), 1);
    assert_eq!(workspace.document(files[1]).unwrap().page_count(), 2);
    assert_eq!(workspace.ledger().len(), 3);
}

#[tokio::test]
async fn test_merge_failure_sets_error_state() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a", 1);
    let output = dir.path().join("merged.pdf");

    let mut workspace = Workspace::new();
    workspace.import(&PdfReader::new(), &[a.clone()]).await;
    fs::remove_file(&a).unwrap();

    let result = workspace.merge(&PdfMerger::new(), &output).await;

    assert!(matches!(result, Err(StudioError::FileNotFound { .. })));
    assert_eq!(workspace.merge_state().status, MergeStatus::Error);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_plan_replay_to_disk() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a", 3);
    let b = write_pdf(dir.path(), "b", 1);
    let plan_path = dir.path().join("plan.json");
    fs::write(
        &plan_path,
        r#"[
            { "op": "moveFile", "file": 2, "before": { "file": 1, "page": 1 } },
            { "op": "deletePage", "page": { "file": 1, "page": 2 } },
            { "op": "rotate", "page": { "file": 1, "page": 3 }, "degrees": 180 },
            { "op": "collapse" }
        ]"#,
    )
    .unwrap();
    let output = dir.path().join("merged.pdf");

    let mut workspace = Workspace::new();
    workspace.import(&PdfReader::new(), &[a, b]).await;
    let plan = Plan::from_json_file(&plan_path).unwrap();
    let summary = plan.apply(&mut workspace, &PdfEditor::new()).await.unwrap();
    assert_eq!(summary.applied, 4);

    assert_eq!(workspace.cards().len(), 2);
    workspace.merge(&PdfMerger::new(), &output).await.unwrap();

    assert_eq!(page_tags(&output), ["b-0", "a-0", "a-2"]);
    assert_eq!(page_rotations(&output), [0, 0, 180]);
}
