//! Generate small PDFs in memory
//!
//! Used by the engine self-check and by tests, which need documents whose
//! pages can be told apart after merging or stamping.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::error::Result;
use crate::layout::Size;
use crate::pdf::font::use_helvetica_font;

/// Create a document whose page `i` (1-based) shows the text `<label>-<i>`
pub fn create_labelled_document(label: &str, page_count: usize, size: Size) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = use_helvetica_font(&mut doc);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(page_count);
    for number in 1..=page_count {
        let text = format!("{label}-{number}");
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(text.into_bytes(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        // Encoding a handful of fixed operations cannot fail
        let bytes = content.encode().unwrap_or_default();
        let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), size.width.into(), size.height.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Same as [`create_labelled_document`], serialized
pub fn create_labelled_pdf(label: &str, page_count: usize, size: Size) -> Result<Vec<u8>> {
    let mut doc = create_labelled_document(label, page_count, size);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_document_pages() {
        let doc = create_labelled_document("A", 3, Size::letter());
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);

        let second = doc.get_page_content(pages[&2]).unwrap();
        assert!(String::from_utf8_lossy(&second).contains("(A-2)"));
    }

    #[test]
    fn test_labelled_pdf_loads_back() {
        let bytes = create_labelled_pdf("B", 2, Size::a4()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
