//! PDF manipulation module

pub mod merge;
pub mod metadata;
pub mod watermark;
pub mod compress;
pub mod split;

use lopdf::{Document, Object, ObjectId};
use crate::error::{Error, Result};
use crate::request::PdfBuffer;

// Re-export commonly used items
pub use merge::merge_documents;
pub use metadata::{inspect, PdfMetadata};
pub use watermark::watermark_document;
pub use compress::compress_document;
pub use split::split_document;

/// Page attributes a page may inherit from an ancestor Pages node
pub(crate) const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Parse an uploaded buffer into a document we can operate on
///
/// Anything lopdf can't parse, encrypted documents and documents without
/// pages are all reported as unsupported files.
pub fn load_document(bytes: &[u8]) -> Result<Document> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| Error::UnsupportedFile(format!("Not a readable PDF: {}", e)))?;

    if doc.is_encrypted() {
        return Err(Error::UnsupportedFile("Encrypted PDFs are not supported".to_string()));
    }

    if doc.get_pages().is_empty() {
        return Err(Error::UnsupportedFile("PDF has no pages".to_string()));
    }

    Ok(doc)
}

/// Serialize a document into a fresh buffer
pub fn save_document(doc: &mut Document) -> Result<PdfBuffer> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(PdfBuffer::new(buffer))
}

/// Look up a page attribute, walking up the page tree when the page itself
/// doesn't carry it
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;

    // Bounded walk so a malformed Parent cycle can't spin forever
    for _ in 0..64 {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;

        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }

        current = match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => *parent_id,
            _ => return None,
        };
    }

    None
}

/// Resolve an object that may be an indirect reference
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}
