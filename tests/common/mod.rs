//! Shared helpers for integration tests

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Build a PDF with `num_pages` pages, each showing `"{label}{n}"`
///
/// Each page carries its own MediaBox and an indirect Resources reference,
/// unlike the unit-test fixture in `pdf::testing` whose pages inherit both
/// from the Pages node. Page content is stored uncompressed and padded with
/// repeated text so the document is comfortably compressible.
pub fn sample_pdf(label: &str, num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for i in 1..=num_pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(format!("{}{}", label, i))]),
        ];
        for _ in 0..40 {
            operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal("The quick brown fox jumps over the lazy dog")],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => num_pages as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Decoded content of every page, in page order
pub fn page_contents(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("output should be a readable PDF");
    doc.get_pages()
        .values()
        .map(|&page_id| String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned())
        .collect()
}

pub fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes)
        .expect("output should be a readable PDF")
        .get_pages()
        .len()
}
