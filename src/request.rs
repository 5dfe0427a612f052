//! Typed, per-request operation inputs
//!
//! Every request owns its input buffers and is moved into the engine call.
//! Constructors enforce the invariants that can be checked without parsing
//! the document; bounds that depend on the page count are checked by the
//! engine.

use crate::error::{Error, Result};

/// An in-memory PDF document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PdfBuffer(Vec<u8>);

impl PdfBuffer {
    /// Wrap raw bytes; nothing is parsed until an engine loads them
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw document bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length upload
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take the bytes back out
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for PdfBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for PdfBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for PdfBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Concatenate documents in order
#[derive(Debug, Clone)]
pub struct MergeRequest {
    files: Vec<PdfBuffer>,
}

impl MergeRequest {
    /// Fails if `files` is empty
    pub fn new(files: Vec<PdfBuffer>) -> Result<Self> {
        if files.is_empty() {
            return Err(Error::invalid_input("No input files provided"));
        }
        Ok(Self { files })
    }

    /// Input documents in merge order
    pub fn files(&self) -> &[PdfBuffer] {
        &self.files
    }

    /// Consume the request, keeping the order
    pub fn into_files(self) -> Vec<PdfBuffer> {
        self.files
    }
}

/// Overlay text on every page
#[derive(Debug, Clone)]
pub struct WatermarkRequest {
    file: PdfBuffer,
    text: String,
}

impl WatermarkRequest {
    /// Fails if `text` is empty or only whitespace
    pub fn new(file: PdfBuffer, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::invalid_input("Watermark text must not be empty"));
        }
        Ok(Self { file, text })
    }

    /// Input document
    pub fn file(&self) -> &PdfBuffer {
        &self.file
    }

    /// Text drawn on each page, as given
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Split into the document and its text
    pub fn into_parts(self) -> (PdfBuffer, String) {
        (self.file, self.text)
    }
}

/// Compression level: 0 stores streams uncompressed, 9 is maximum deflate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Store streams uncompressed
    pub const NONE: CompressionLevel = CompressionLevel(0);
    /// Maximum deflate effort, also the default
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Accepts any integer so out-of-range values (including negatives)
    /// are reported as invalid input instead of a parse failure.
    pub fn new(level: i64) -> Result<Self> {
        if !(0..=9).contains(&level) {
            return Err(Error::invalid_input(format!(
                "Compression level must be between 0 and 9, got {}",
                level
            )));
        }
        Ok(Self(level as u8))
    }

    /// Level as a number in `0..=9`
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::MAX
    }
}

/// Re-encode a document at a given level
#[derive(Debug, Clone)]
pub struct CompressRequest {
    file: PdfBuffer,
    level: CompressionLevel,
}

impl CompressRequest {
    /// Level bounds are already enforced by [`CompressionLevel::new`]
    pub fn new(file: PdfBuffer, level: CompressionLevel) -> Self {
        Self { file, level }
    }

    /// Input document
    pub fn file(&self) -> &PdfBuffer {
        &self.file
    }

    /// Requested level
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Split into the document and its level
    pub fn into_parts(self) -> (PdfBuffer, CompressionLevel) {
        (self.file, self.level)
    }
}

/// Inclusive, 1-indexed page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    /// Fails unless `1 <= start <= end`
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start < 1 {
            return Err(Error::invalid_input(format!(
                "Start page must be at least 1, got {}",
                start
            )));
        }
        if start > end {
            return Err(Error::invalid_input(format!(
                "Start page {} is after end page {}",
                start, end
            )));
        }
        let end = u32::try_from(end)
            .map_err(|_| Error::invalid_input(format!("End page {} is out of range", end)))?;

        Ok(Self {
            start: start as u32,
            end,
        })
    }

    /// First page kept (1-indexed)
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last page kept (inclusive)
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of pages selected
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Whether a 1-indexed page number falls inside the range
    pub fn contains(&self, page: u32) -> bool {
        (self.start..=self.end).contains(&page)
    }

    /// Check the range against a document's page count
    pub fn check_within(&self, page_count: u32) -> Result<()> {
        if self.end > page_count {
            return Err(Error::invalid_input(format!(
                "End page {} does not exist (document has {} pages)",
                self.end, page_count
            )));
        }
        Ok(())
    }
}

/// Extract a page range into a new document
#[derive(Debug, Clone)]
pub struct SplitRequest {
    file: PdfBuffer,
    range: PageRange,
}

impl SplitRequest {
    /// The range is checked against the page count when the engine runs
    pub fn new(file: PdfBuffer, range: PageRange) -> Self {
        Self { file, range }
    }

    /// Input document
    pub fn file(&self) -> &PdfBuffer {
        &self.file
    }

    /// Pages to keep
    pub fn range(&self) -> PageRange {
        self.range
    }

    /// Split into the document and its range
    pub fn into_parts(self) -> (PdfBuffer, PageRange) {
        (self.file, self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_merge_request_rejects_empty() {
        let err = MergeRequest::new(vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("No input files"));
    }

    #[test]
    fn test_merge_request_keeps_order() {
        let req = MergeRequest::new(vec![
            PdfBuffer::from(b"a".as_slice()),
            PdfBuffer::from(b"b".as_slice()),
        ])
        .unwrap();
        let names: Vec<&[u8]> = req.files().iter().map(|f| f.as_bytes()).collect();
        assert_eq!(names, vec![b"a".as_slice(), b"b".as_slice()]);
    }

    #[test]
    fn test_watermark_request_rejects_blank_text() {
        assert!(WatermarkRequest::new(PdfBuffer::default(), "").is_err());
        assert!(WatermarkRequest::new(PdfBuffer::default(), "   ").is_err());
        assert!(WatermarkRequest::new(PdfBuffer::default(), "DRAFT").is_ok());
    }

    #[test]
    fn test_compression_level_bounds() {
        assert_eq!(CompressionLevel::new(0).unwrap(), CompressionLevel::NONE);
        assert_eq!(CompressionLevel::new(9).unwrap(), CompressionLevel::MAX);
        assert!(CompressionLevel::new(10).is_err());
        assert!(CompressionLevel::new(-1).is_err());
    }

    #[test]
    fn test_page_range_rejects_reversed() {
        let err = PageRange::new(5, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_page_range_rejects_zero_start() {
        assert!(PageRange::new(0, 3).is_err());
    }

    #[test]
    fn test_page_range_check_within() {
        let range = PageRange::new(2, 4).unwrap();
        assert!(range.check_within(4).is_ok());
        assert!(range.check_within(3).is_err());
        assert_eq!(range.len(), 3);
        assert!(range.contains(2) && range.contains(4) && !range.contains(5));
    }

    proptest! {
        #[test]
        fn compression_level_accepts_exactly_zero_to_nine(level in -100i64..100) {
            let result = CompressionLevel::new(level);
            prop_assert_eq!(result.is_ok(), (0..=9).contains(&level));
            if let Err(err) = result {
                prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
            }
        }

        #[test]
        fn page_range_len_matches_bounds(start in 1i64..500, extra in 0i64..500) {
            let range = PageRange::new(start, start + extra).unwrap();
            prop_assert_eq!(range.len() as i64, extra + 1);
        }

        #[test]
        fn reversed_page_range_is_invalid(end in 1i64..500, gap in 1i64..500) {
            let err = PageRange::new(end + gap, end).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }
}
