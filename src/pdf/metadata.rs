//! PDF metadata extraction

use lopdf::{Document, Object};
use crate::error::Result;
use crate::pdf::{load_document, resolve};

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// PDF header version, e.g. "1.7"
    pub version: String,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
}

/// Extract metadata from an in-memory PDF
pub fn inspect(bytes: &[u8]) -> Result<PdfMetadata> {
    let doc = load_document(bytes)?;

    Ok(PdfMetadata {
        page_count: doc.get_pages().len(),
        version: doc.version.clone(),
        title: info_string(&doc, b"Title"),
        author: info_string(&doc, b"Author"),
    })
}

/// Read a text entry from the trailer's Info dictionary
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = resolve(doc, doc.trailer.get(b"Info").ok()?);
    let Object::Dictionary(info_dict) = info else {
        return None;
    };

    let value = resolve(doc, info_dict.get(key).ok()?);
    let text = lopdf::decode_text_string(value).ok()?;

    // UTF-8 text strings keep their byte order mark after decoding
    match text.strip_prefix('\u{FEFF}') {
        Some(stripped) => Some(stripped.to_string()),
        None => Some(text),
    }
}
