//! The PDF capability the service delegates to
//!
//! [`PdfEngine`] is the seam between the HTTP facade and whatever actually
//! manipulates documents. [`LopdfEngine`] is the bundled implementation built
//! on the [`crate::pdf`] module.

use crate::error::Result;
use crate::pdf;
use crate::request::{CompressRequest, MergeRequest, PdfBuffer, SplitRequest, WatermarkRequest};

/// Document operations on in-memory buffers
///
/// Implementations are called from blocking worker threads and must not hold
/// per-request state between calls.
pub trait PdfEngine: Send + Sync {
    /// Concatenate all pages of the inputs, in input order
    fn merge(&self, request: MergeRequest) -> Result<PdfBuffer>;

    /// Overlay the text on every page
    fn watermark(&self, request: WatermarkRequest) -> Result<PdfBuffer>;

    /// Re-encode the document at the requested level
    fn compress(&self, request: CompressRequest) -> Result<PdfBuffer>;

    /// Keep only the requested page range
    fn split(&self, request: SplitRequest) -> Result<PdfBuffer>;
}

/// [`PdfEngine`] backed by lopdf
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl PdfEngine for LopdfEngine {
    fn merge(&self, request: MergeRequest) -> Result<PdfBuffer> {
        pdf::merge_documents(request)
    }

    fn watermark(&self, request: WatermarkRequest) -> Result<PdfBuffer> {
        pdf::watermark_document(request)
    }

    fn compress(&self, request: CompressRequest) -> Result<PdfBuffer> {
        pdf::compress_document(request)
    }

    fn split(&self, request: SplitRequest) -> Result<PdfBuffer> {
        pdf::split_document(request)
    }
}
