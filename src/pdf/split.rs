//! Page range extraction

use lopdf::Document;
use crate::error::Result;
use crate::pdf::{load_document, save_document};
use crate::request::{PdfBuffer, SplitRequest};

/// Keep only the pages in the request's inclusive range
///
/// The range is checked against the document's page count here, since it
/// isn't known until the document is parsed.
pub fn split_document(request: SplitRequest) -> Result<PdfBuffer> {
    let (file, range) = request.into_parts();
    let mut doc: Document = load_document(file.as_bytes())?;

    let page_count = doc.get_pages().len() as u32;
    range.check_within(page_count)?;

    // Delete in reverse so the remaining page numbers stay valid
    let pages_to_delete: Vec<u32> = (1..=page_count)
        .rev()
        .filter(|page| !range.contains(*page))
        .collect();

    tracing::debug!(
        start = range.start(),
        end = range.end(),
        page_count,
        deleting = pages_to_delete.len(),
        "splitting document"
    );

    doc.delete_pages(&pages_to_delete);

    // Drop objects only the deleted pages referenced
    doc.prune_objects();
    doc.compress();

    save_document(&mut doc)
}
