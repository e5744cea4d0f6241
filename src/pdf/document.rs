//! Loading and saving documents as byte buffers

use chrono::Local;
use lopdf::{Dictionary, Document, Object, StringFormat};
use tracing::debug;

use crate::error::{Error, Result};

/// Producer string written into every saved document
pub const PRODUCER: &str = concat!("pdf-tools ", env!("CARGO_PKG_VERSION"));

/// Parse a document and check that it has pages
pub fn load_document(bytes: &[u8], name: &str) -> Result<Document> {
    let doc = Document::load_mem(bytes)?;
    if doc.get_pages().is_empty() {
        return Err(Error::EmptyPdf(name.to_string()));
    }
    debug!(file = name, pages = doc.get_pages().len(), version = %doc.version, "loaded document");
    Ok(doc)
}

/// Serialize a document, refreshing its Info dictionary first
///
/// Encrypted documents are written as they are: their Info strings were
/// stamped before encryption and anything added now would stay plaintext.
pub fn save_document(doc: &mut Document) -> Result<Vec<u8>> {
    if !doc.trailer.has(b"Encrypt") {
        stamp_info(doc)?;
    }
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Set `/Producer` and `/ModDate`, creating the Info dictionary if needed
pub(crate) fn stamp_info(doc: &mut Document) -> Result<()> {
    let mod_date = format!("D:{}", Local::now().format("%Y%m%d%H%M%S"));
    let producer = Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal);
    let mod_date = Object::String(mod_date.into_bytes(), StringFormat::Literal);

    let info_id = match doc.trailer.get(b"Info").and_then(Object::as_reference) {
        Ok(id) if doc.get_dictionary(id).is_ok() => id,
        _ => {
            let id = doc.add_object(Dictionary::new());
            doc.trailer.set("Info", Object::Reference(id));
            id
        }
    };

    let info = doc.get_dictionary_mut(info_id)?;
    info.set("Producer", producer);
    info.set("ModDate", mod_date);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Size;
    use crate::pdf::create::create_labelled_pdf;

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(load_document(b"not a pdf", "x.pdf"), Err(Error::Pdf(_))));
    }

    #[test]
    fn test_save_sets_producer() {
        let bytes = create_labelled_pdf("A", 1, Size::letter()).unwrap();
        let mut doc = load_document(&bytes, "a.pdf").unwrap();
        let saved = save_document(&mut doc).unwrap();

        let reloaded = Document::load_mem(&saved).unwrap();
        let info_id = reloaded.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = reloaded.get_dictionary(info_id).unwrap();
        assert_eq!(info.get(b"Producer").unwrap().as_str().unwrap(), PRODUCER.as_bytes());
        assert!(info.has(b"ModDate"));
    }
}
