//! PDF metadata extraction

use lopdf::{Document, Object};

use crate::error::{Error, Result};

/// Count pages by reading the Count field from the Pages dictionary
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = doc
        .catalog()
        .map_err(|_| Error::General("No catalog in document".to_string()))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| Error::General("No Pages in catalog".to_string()))?;

    let pages_dict = doc.get_dictionary(pages_id)?;

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        _ => Err(Error::General("Count is not an integer".to_string())),
    }
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// PDF header version, e.g. `1.7`
    pub version: String,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Producer recorded by the last writer (if present)
    pub producer: Option<String>,
    /// Whether the file carries an Encrypt dictionary
    pub encrypted: bool,
}

/// Extract metadata from PDF bytes
pub fn extract_metadata(bytes: &[u8], name: &str) -> Result<PdfMetadata> {
    let doc = Document::load_mem(bytes)?;

    // Prefer the walked page tree; fall back to the declared Count
    let page_count = match doc.get_pages().len() {
        0 => count_pages_from_catalog(&doc)?,
        n => n,
    };

    if page_count == 0 {
        return Err(Error::EmptyPdf(name.to_string()));
    }

    let info_string = |key: &[u8]| -> Option<String> {
        let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).ok()?;
        let info = doc.get_dictionary(info_id).ok()?;
        let bytes = info.get(key).and_then(Object::as_str).ok()?;
        String::from_utf8(bytes.to_vec()).ok()
    };

    Ok(PdfMetadata {
        page_count,
        version: doc.version.clone(),
        title: info_string(b"Title"),
        author: info_string(b"Author"),
        producer: info_string(b"Producer"),
        encrypted: doc.trailer.has(b"Encrypt"),
    })
}

/// Count the number of pages in a PDF buffer
pub fn count_pages(bytes: &[u8], name: &str) -> Result<usize> {
    extract_metadata(bytes, name).map(|m| m.page_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Size;
    use crate::pdf::create::{create_labelled_document, create_labelled_pdf};

    #[test]
    fn test_count_pages() {
        let bytes = create_labelled_pdf("A", 4, Size::letter()).unwrap();
        assert_eq!(count_pages(&bytes, "a.pdf").unwrap(), 4);
    }

    #[test]
    fn test_catalog_count_matches_tree() {
        let doc = create_labelled_document("A", 3, Size::letter());
        assert_eq!(count_pages_from_catalog(&doc).unwrap(), 3);
    }

    #[test]
    fn test_metadata_of_garbage() {
        assert!(extract_metadata(b"%PDF-1.4 nonsense", "bad.pdf").is_err());
    }

    #[test]
    fn test_metadata_fields() {
        let bytes = create_labelled_pdf("A", 1, Size::letter()).unwrap();
        let metadata = extract_metadata(&bytes, "a.pdf").unwrap();
        assert_eq!(metadata.version, "1.5");
        assert!(metadata.title.is_none());
        assert!(!metadata.encrypted);
    }
}
