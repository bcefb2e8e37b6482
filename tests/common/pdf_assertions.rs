use lopdf::{Document, Object};
use std::path::Path;

pub fn page_count(path: &Path) -> usize {
    Document::load(path)
        .unwrap_or_else(|e| panic!("{} is not a readable PDF: {}", path.display(), e))
        .get_pages()
        .len()
}

/// The `Width` of every image drawn on each page, in drawing order.
pub fn image_widths_per_page(path: &Path) -> Vec<Vec<i64>> {
    let doc = Document::load(path).unwrap();
    let mut pages = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let xobjects = page
            .get(b"Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get(b"XObject"))
            .and_then(Object::as_dict)
            .unwrap();

        let mut widths = Vec::new();
        for i in 0..xobjects.len() {
            let id = xobjects.get(format!("Im{}", i).as_bytes()).and_then(Object::as_reference).unwrap();
            let stream = doc.get_object(id).and_then(Object::as_stream).unwrap();
            widths.push(stream.dict.get(b"Width").and_then(Object::as_i64).unwrap());
        }
        pages.push(widths);
    }
    pages
}

/// Asserts the PDF at `$path` has exactly `$count` pages.
#[macro_export]
macro_rules! assert_pdf_page_count {
    ($path:expr, $count:expr) => {
        assert_eq!(
            $crate::common::pdf_assertions::page_count($path.as_ref()),
            $count,
            "unexpected page count in {}",
            ::std::path::Path::display($path.as_ref())
        )
    };
}
