//! Helpers shared by the integration tests.
//!
//! PDFs are generated with lopdf in a temp directory; there are no binary
//! fixtures. Every page carries a `Tag` string `"<label>-<index>"` so the
//! order of a merged file can be checked.

use lopdf::{Document, Object, dictionary};
use pdfstudio::Workspace;
use pdfstudio::model::{FileId, PageId};
use pdfstudio::services::PdfInfo;
use std::path::{Path, PathBuf};

/// Write an `n`-page PDF to `dir/<label>.pdf`.
pub fn write_pdf(dir: &Path, label: &str, pages: usize) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|index| {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Tag" => Object::string_literal(format!("{label}-{index}")),
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(format!("{label}.pdf"));
    doc.save(&path).expect("Failed to write test PDF");
    path
}

/// Page tags of the PDF at `path`, in page order.
pub fn page_tags(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("Failed to load PDF");
    doc.get_pages()
        .values()
        .map(|&id| match doc.get_dictionary(id).unwrap().get(b"Tag").unwrap() {
            Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
            other => panic!("unexpected tag {other:?}"),
        })
        .collect()
}

/// `/Rotate` of every page of the PDF at `path`, 0 when absent.
pub fn page_rotations(path: &Path) -> Vec<i64> {
    let doc = Document::load(path).expect("Failed to load PDF");
    doc.get_pages()
        .values()
        .map(|&id| {
            doc.get_dictionary(id)
                .unwrap()
                .get(b"Rotate")
                .and_then(Object::as_i64)
                .unwrap_or(0)
        })
        .collect()
}

/// Session with one document per entry of `counts`, named `A.pdf`,
/// `B.pdf`, ... No files are touched.
pub fn workspace_with(counts: &[usize]) -> (Workspace, Vec<FileId>) {
    let mut workspace = Workspace::new();
    let files = counts
        .iter()
        .enumerate()
        .map(|(i, &page_count)| {
            let name = char::from(b'A' + i as u8);
            workspace.add_document(
                format!("/docs/{name}.pdf"),
                PdfInfo {
                    page_count,
                    title: None,
                },
            )
        })
        .collect();
    (workspace, files)
}

/// Id of the page at `index` in `file`.
pub fn page(workspace: &Workspace, file: FileId, index: usize) -> PageId {
    workspace.document(file).unwrap().pages()[index].id()
}

/// Merge order as `"A0"`, `"B2"`, ... labels.
pub fn order(workspace: &Workspace) -> Vec<String> {
    workspace
        .ledger()
        .iter()
        .map(|entry| {
            let doc = workspace.document(entry.file_id).unwrap();
            let index = doc.page(entry.page_id).unwrap().source_page_index();
            format!("{}{index}", doc.name().trim_end_matches(".pdf"))
        })
        .collect()
}
