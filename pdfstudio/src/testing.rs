//! PDF builders shared by unit tests.

use lopdf::{Document, Object, dictionary};
use std::path::{Path, PathBuf};

/// Build an `n`-page document. Every page carries a `Tag` string
/// `"<label>-<index>"` so tests can tell pages apart after a merge.
pub fn sample_pdf(label: &str, pages: usize, title: Option<&str>) -> Document {
    let mut doc = Document::with_version("1.5");

    let catalog_id = doc.new_object_id();
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages);
    for index in 0..pages {
        let page_id = doc.new_object_id();
        let page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Tag" => Object::string_literal(format!("{label}-{index}")),
        };
        doc.objects.insert(page_id, page.into());
        kids.push(Object::Reference(page_id));
    }

    let catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages as i64,
    };
    doc.objects.insert(catalog_id, catalog.into());
    doc.objects.insert(pages_id, pages_dict.into());
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
        });
        doc.trailer.set("Info", info_id);
    }

    doc
}

/// Write [`sample_pdf`] to `dir/<label>.pdf`.
pub fn write_sample_pdf(dir: &Path, label: &str, pages: usize) -> PathBuf {
    let path = dir.join(format!("{label}.pdf"));
    sample_pdf(label, pages, None).save(&path).unwrap();
    path
}

/// Page tags in page order.
pub fn page_tags(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&id| {
            let page = doc.get_dictionary(id).unwrap();
            match page.get(b"Tag").unwrap() {
                Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
                other => panic!("unexpected tag {other:?}"),
            }
        })
        .collect()
}

/// `/Rotate` of every page, 0 when absent.
pub fn page_rotations(doc: &Document) -> Vec<i64> {
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
