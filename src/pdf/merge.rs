//! PDF merging functionality using lopdf

use std::collections::BTreeMap;
use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::error::Result;
use crate::pdf::{inherited_attribute, load_document, save_document, INHERITABLE_PAGE_KEYS};
use crate::request::{MergeRequest, PdfBuffer};

/// Merge multiple PDF documents into a single PDF
///
/// Pages appear in the order the inputs were given. Based on the lopdf merge
/// example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
pub fn merge_documents(request: MergeRequest) -> Result<PdfBuffer> {
    // Load all documents
    let mut documents: Vec<Document> = Vec::new();
    for file in request.into_files() {
        documents.push(load_document(file.as_bytes())?);
    }

    // Define a starting max_id for merged document
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);

        // Update max_id for next document
        max_id = doc.max_id + 1;

        // Pages are about to lose their old parent, so pull down anything
        // they were inheriting from it first
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for &page_id in &pages {
            flatten_inherited_attributes(&mut doc, page_id);
        }
        page_ids.extend(pages);

        // Collect all objects from this document
        objects.extend(doc.objects);
    }

    tracing::debug!(pages = page_ids.len(), "collected pages for merge");

    let mut merged_doc = Document::with_version("1.5");

    // Add all collected objects FIRST
    merged_doc.objects.extend(objects);

    // new_object_id() must hand out ids above everything we just added
    merged_doc.max_id = max_id - 1;

    let pages_id = merged_doc.new_object_id();

    let kids: Vec<Object> = page_ids
        .iter()
        .map(|&id| Object::Reference(id))
        .collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = merged_doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
    merged_doc.trailer.set("Root", Object::Reference(catalog_id));

    // Update parent references for all pages
    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    // Old catalogs and page tree nodes are unreachable now
    merged_doc.prune_objects();
    merged_doc.compress();

    save_document(&mut merged_doc)
}

/// Copy inherited page attributes onto the page itself
fn flatten_inherited_attributes(doc: &mut Document, page_id: ObjectId) {
    let inherited: Vec<(&[u8], Object)> = INHERITABLE_PAGE_KEYS
        .iter()
        .filter_map(|&key| inherited_attribute(doc, page_id, key).map(|value| (key, value)))
        .collect();

    if let Ok(Object::Dictionary(page_dict)) = doc.get_object_mut(page_id) {
        for (key, value) in inherited {
            if !page_dict.has(key) {
                page_dict.set(key.to_vec(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pdf::testing::{page_contents, sample_pdf};

    fn merge(inputs: Vec<Vec<u8>>) -> Result<PdfBuffer> {
        let files = inputs.into_iter().map(PdfBuffer::from).collect();
        merge_documents(MergeRequest::new(files)?)
    }

    #[test]
    fn test_merge_two_plus_three_pages() {
        let merged = merge(vec![sample_pdf("A", 2), sample_pdf("B", 3)]).unwrap();

        let contents = page_contents(merged.as_bytes());
        assert_eq!(contents.len(), 5);

        let expected = ["A1", "A2", "B1", "B2", "B3"];
        for (content, marker) in contents.iter().zip(expected) {
            assert!(
                content.contains(&format!("({})", marker)),
                "expected {} in page content {:?}",
                marker,
                content
            );
        }
    }

    #[test]
    fn test_merge_single_file() {
        let merged = merge(vec![sample_pdf("Solo", 4)]).unwrap();
        assert_eq!(page_contents(merged.as_bytes()).len(), 4);
    }

    #[test]
    fn test_merge_keeps_inherited_resources() {
        let merged = merge(vec![sample_pdf("A", 1), sample_pdf("B", 1)]).unwrap();
        let doc = Document::load_mem(merged.as_bytes()).unwrap();

        for page_id in doc.get_pages().into_values() {
            let page = doc.get_dictionary(page_id).unwrap();
            assert!(page.has(b"Resources"), "page lost its inherited Resources");
            assert!(page.has(b"MediaBox"), "page lost its inherited MediaBox");
        }
    }

    #[test]
    fn test_merge_rejects_non_pdf_member() {
        let err = merge(vec![sample_pdf("A", 1), b"garbage".to_vec()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFile);
    }
}
