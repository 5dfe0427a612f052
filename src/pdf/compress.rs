//! Stream recompression at a caller-chosen level
//!
//! Level 0 stores every Flate-capable stream uncompressed; levels 1-9 deflate
//! them with that zlib level. Streams using other filters (images in DCT,
//! JBIG2, ...) or predictor parameters are passed through untouched.

use std::io::{Read, Write};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Object, Stream};
use crate::error::Result;
use crate::pdf::{load_document, save_document};
use crate::request::{CompressRequest, CompressionLevel, PdfBuffer};

/// What a stream's Filter entry says about its encoding
#[derive(Debug, PartialEq, Eq)]
enum StreamEncoding {
    Plain,
    Flate,
    Other,
}

/// Re-encode every eligible stream in the document at the requested level
pub fn compress_document(request: CompressRequest) -> Result<PdfBuffer> {
    let (file, level) = request.into_parts();
    let mut doc = load_document(file.as_bytes())?;

    let mut recoded = 0usize;
    let mut skipped = 0usize;
    for object in doc.objects.values_mut() {
        if let Object::Stream(stream) = object {
            if recode_stream(stream, level)? {
                recoded += 1;
            } else {
                skipped += 1;
            }
        }
    }

    let pruned = doc.prune_objects().len();
    tracing::debug!(level = level.value(), recoded, skipped, pruned, "recompressed streams");

    save_document(&mut doc)
}

/// Returns whether the stream was rewritten
fn recode_stream(stream: &mut Stream, level: CompressionLevel) -> Result<bool> {
    let plain = match stream_encoding(stream) {
        StreamEncoding::Plain => stream.content.clone(),
        StreamEncoding::Flate => {
            if stream.dict.has(b"DecodeParms") {
                return Ok(false);
            }
            match inflate(&stream.content) {
                Ok(plain) => plain,
                // Leave damaged streams exactly as we found them
                Err(_) => return Ok(false),
            }
        }
        StreamEncoding::Other => return Ok(false),
    };

    stream.dict.remove(b"Filter");
    stream.dict.remove(b"DecodeParms");

    if level == CompressionLevel::NONE {
        stream.allows_compression = false;
        stream.set_content(plain);
    } else {
        let compressed = deflate(&plain, level)?;
        stream.dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        stream.set_content(compressed);
    }

    Ok(true)
}

fn stream_encoding(stream: &Stream) -> StreamEncoding {
    fn is_flate(name: &[u8]) -> bool {
        name == b"FlateDecode" || name == b"Fl"
    }

    match stream.dict.get(b"Filter") {
        Err(_) => StreamEncoding::Plain,
        Ok(Object::Name(name)) if is_flate(name) => StreamEncoding::Flate,
        Ok(Object::Array(filters)) => match filters.as_slice() {
            [] => StreamEncoding::Plain,
            [Object::Name(name)] if is_flate(name) => StreamEncoding::Flate,
            _ => StreamEncoding::Other,
        },
        Ok(_) => StreamEncoding::Other,
    }
}

fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut plain = Vec::new();
    decoder.read_to_end(&mut plain)?;
    Ok(plain)
}

fn deflate(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level.value() as u32));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pdf::testing::{page_contents, sample_pdf};
    use lopdf::Document;

    fn compress(bytes: Vec<u8>, level: i64) -> Result<PdfBuffer> {
        let level = CompressionLevel::new(level)?;
        compress_document(CompressRequest::new(PdfBuffer::from(bytes), level))
    }

    fn stream_filters(bytes: &[u8]) -> Vec<StreamEncoding> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.objects
            .values()
            .filter_map(|object| match object {
                Object::Stream(stream) => Some(stream_encoding(stream)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_level_zero_leaves_streams_plain() {
        let input = sample_pdf("Z", 3);
        let output = compress(input, 0).unwrap();

        assert_eq!(page_contents(output.as_bytes()).len(), 3);
        let encodings = stream_filters(output.as_bytes());
        assert!(!encodings.is_empty());
        assert!(encodings.iter().all(|e| *e == StreamEncoding::Plain));
    }

    #[test]
    fn test_level_nine_deflates_streams() {
        let output = compress(sample_pdf("N", 2), 9).unwrap();

        assert!(stream_filters(output.as_bytes()).iter().all(|e| *e == StreamEncoding::Flate));
        let contents = page_contents(output.as_bytes());
        assert!(contents[0].contains("(N1)"));
        assert!(contents[1].contains("(N2)"));
    }

    #[test]
    fn test_out_of_range_level_is_invalid_input() {
        assert_eq!(compress(sample_pdf("X", 1), 10).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(compress(sample_pdf("X", 1), -1).unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_other_filters_untouched() {
        let mut dict = lopdf::Dictionary::new();
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        let mut stream = Stream::new(dict, vec![0xFF, 0xD8, 0xFF]);

        assert!(!recode_stream(&mut stream, CompressionLevel::MAX).unwrap());
        assert_eq!(stream.content, vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_flate_round_trip_between_levels() {
        let plain = b"BT /F1 12 Tf (hello) Tj ET\n".repeat(50);
        let mut stream = Stream::new(lopdf::Dictionary::new(), plain.clone());

        assert!(recode_stream(&mut stream, CompressionLevel::MAX).unwrap());
        assert!(stream.content.len() < plain.len());
        assert_eq!(stream_encoding(&stream), StreamEncoding::Flate);

        assert!(recode_stream(&mut stream, CompressionLevel::NONE).unwrap());
        assert_eq!(stream.content, plain);
        assert_eq!(stream_encoding(&stream), StreamEncoding::Plain);
    }
}
