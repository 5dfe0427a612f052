//! Text watermark overlay using lopdf
//!
//! The watermark is drawn diagonally across the centre of every page in
//! translucent gray Helvetica. Existing page content is wrapped in a q/Q pair
//! so any transformation it leaves behind doesn't leak into the overlay.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use crate::error::Result;
use crate::pdf::{inherited_attribute, load_document, resolve, save_document};
use crate::request::{PdfBuffer, WatermarkRequest};

/// Resource names chosen to stay clear of names the source PDF may use
const FONT_RESOURCE: &str = "PdfConverterWatermarkFont";
const GSTATE_RESOURCE: &str = "PdfConverterWatermarkGs";

/// US Letter, used when a page has no readable MediaBox
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Average Helvetica glyph width as a fraction of the font size
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

const OPACITY: f32 = 0.3;
const GRAY_LEVEL: f32 = 0.5;
const MIN_FONT_SIZE: f32 = 8.0;
const MAX_FONT_SIZE: f32 = 96.0;

/// Overlay the request's text on every page
pub fn watermark_document(request: WatermarkRequest) -> Result<PdfBuffer> {
    let (file, text) = request.into_parts();
    let mut doc = load_document(file.as_bytes())?;

    let font_id = use_helvetica_font(&mut doc);

    let mut gstate = Dictionary::new();
    gstate.set("Type", Object::Name(b"ExtGState".to_vec()));
    gstate.set("ca", Object::Real(OPACITY));
    gstate.set("CA", Object::Real(OPACITY));
    let gstate_id = doc.add_object(Object::Dictionary(gstate));

    let encoded = encode_win_ansi(&text);

    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    tracing::debug!(pages = pages.len(), "applying watermark");

    for page_id in pages {
        let media_box = page_media_box(&doc, page_id);
        let overlay = overlay_content(&encoded, media_box)?;

        let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

        add_watermark_resources(&mut doc, page_id, font_id, gstate_id)?;
        wrap_page_contents(&mut doc, page_id, open_id, overlay_id)?;
    }

    doc.compress();
    save_document(&mut doc)
}

/// Use Helvetica (standard PDF font - nothing to embed)
fn use_helvetica_font(doc: &mut Document) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));

    doc.add_object(Object::Dictionary(font))
}

/// Encode text for a WinAnsi simple font
///
/// Latin-1 printable characters map to themselves, whitespace controls become
/// spaces and anything else is replaced with `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.trim()
        .chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ if c.is_whitespace() => b' ',
            _ => b'?',
        })
        .collect()
}

/// Read the page's MediaBox, following inheritance
fn page_media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let Some(media_box) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return DEFAULT_MEDIA_BOX;
    };

    let values: Vec<f32> = match resolve(doc, &media_box) {
        Object::Array(items) => items
            .iter()
            .filter_map(|item| resolve(doc, item).as_float().ok())
            .collect(),
        _ => Vec::new(),
    };

    match values.as_slice() {
        [x0, y0, x1, y1] if x1 != x0 && y1 != y0 => [*x0, *y0, *x1, *y1],
        _ => DEFAULT_MEDIA_BOX,
    }
}

/// Build the content stream appended after the page's own content
///
/// Starts by closing the `q` that was prepended to the page, then draws the
/// text rotated along the page diagonal and centred on the page.
fn overlay_content(text: &[u8], media_box: [f32; 4]) -> Result<Vec<u8>> {
    let [x0, y0, x1, y1] = media_box;
    let (width, height) = ((x1 - x0).abs(), (y1 - y0).abs());
    let (center_x, center_y) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);

    let angle = height.atan2(width);
    let (sin, cos) = angle.sin_cos();
    let diagonal = width.hypot(height);

    let glyphs = text.len().max(1) as f32;
    let font_size = (diagonal * 0.6 / (glyphs * AVERAGE_GLYPH_WIDTH)).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
    let text_width = glyphs * AVERAGE_GLYPH_WIDTH * font_size;

    // Shift back by half the text box in the rotated frame
    let (u, v) = (-text_width / 2.0, -font_size * 0.35);
    let origin_x = center_x + u * cos - v * sin;
    let origin_y = center_y + u * sin + v * cos;

    let content = Content {
        operations: vec![
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("gs", vec![Object::Name(GSTATE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("g", vec![Object::Real(GRAY_LEVEL)]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), Object::Real(font_size)],
            ),
            Operation::new(
                "Tm",
                vec![
                    Object::Real(cos),
                    Object::Real(sin),
                    Object::Real(-sin),
                    Object::Real(cos),
                    Object::Real(origin_x),
                    Object::Real(origin_y),
                ],
            ),
            Operation::new("Tj", vec![Object::String(text.to_vec(), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    };

    let mut bytes = b"\n".to_vec();
    bytes.extend(content.encode()?);
    Ok(bytes)
}

/// Give the page its own Resources dictionary with our font and graphics state
///
/// Inherited and indirect resources are copied in first so the page keeps
/// everything its original content refers to.
fn add_watermark_resources(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    gstate_id: ObjectId,
) -> Result<()> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources") {
        Some(res) => match resolve(doc, &res) {
            Object::Dictionary(dict) => dict.clone(),
            _ => Dictionary::new(),
        },
        None => Dictionary::new(),
    };

    let mut fonts = resource_category(doc, &resources, b"Font");
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let mut gstates = resource_category(doc, &resources, b"ExtGState");
    gstates.set(GSTATE_RESOURCE, Object::Reference(gstate_id));
    resources.set("ExtGState", Object::Dictionary(gstates));

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(())
}

/// Clone one sub-dictionary of a Resources dictionary (Font, ExtGState, ...)
fn resource_category(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    match resources.get(key).map(|value| resolve(doc, value)) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    }
}

/// Replace Contents with `[open, ...existing, overlay]`
fn wrap_page_contents(
    doc: &mut Document,
    page_id: ObjectId,
    open_id: ObjectId,
    overlay_id: ObjectId,
) -> Result<()> {
    let existing: Vec<Object> = {
        let page_dict = doc.get_dictionary(page_id)?;
        match page_dict.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                // Contents may point at an array of streams
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Contents", Object::Array(contents));

    Ok(())
}
