//! Manipulation service: forwards typed requests to the engine
//!
//! Engine calls are CPU-bound, so each one runs on tokio's blocking pool and
//! the async runtime keeps serving other requests meanwhile.

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::engine::PdfEngine;
use crate::error::{Error, Result};
use crate::request::{CompressRequest, MergeRequest, PdfBuffer, SplitRequest, WatermarkRequest};

#[derive(Clone)]
pub struct ManipulationService {
    engine: Arc<dyn PdfEngine>,
}

impl ManipulationService {
    pub fn new(engine: Arc<dyn PdfEngine>) -> Self {
        Self { engine }
    }

    pub async fn merge(&self, request: MergeRequest) -> Result<PdfBuffer> {
        let input_bytes: usize = request.files().iter().map(PdfBuffer::len).sum();
        info!(files = request.files().len(), input_bytes, "merge requested");
        self.run("merge", input_bytes, move |engine| engine.merge(request)).await
    }

    pub async fn watermark(&self, request: WatermarkRequest) -> Result<PdfBuffer> {
        let input_bytes = request.file().len();
        info!(input_bytes, text_len = request.text().len(), "watermark requested");
        self.run("watermark", input_bytes, move |engine| engine.watermark(request)).await
    }

    pub async fn compress(&self, request: CompressRequest) -> Result<PdfBuffer> {
        let input_bytes = request.file().len();
        info!(input_bytes, level = request.level().value(), "compress requested");
        self.run("compress", input_bytes, move |engine| engine.compress(request)).await
    }

    pub async fn split(&self, request: SplitRequest) -> Result<PdfBuffer> {
        let input_bytes = request.file().len();
        let range = request.range();
        info!(input_bytes, start = range.start(), end = range.end(), "split requested");
        self.run("split", input_bytes, move |engine| engine.split(request)).await
    }

    async fn run<F>(&self, operation: &'static str, input_bytes: usize, call: F) -> Result<PdfBuffer>
    where
        F: FnOnce(&dyn PdfEngine) -> Result<PdfBuffer> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        let started = Instant::now();

        let output = tokio::task::spawn_blocking(move || call(engine.as_ref()))
            .await
            .map_err(|e| Error::General(format!("{} task failed: {}", operation, e)))??;

        info!(
            operation,
            input_bytes,
            output_bytes = output.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "operation complete"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LopdfEngine;
    use crate::error::ErrorKind;
    use crate::pdf::testing::{page_contents, sample_pdf};
    use crate::request::PageRange;

    /// Engine that fails every call, to check errors pass through unchanged
    struct FailingEngine;

    impl PdfEngine for FailingEngine {
        fn merge(&self, _: MergeRequest) -> Result<PdfBuffer> {
            Err(Error::General("merge exploded".into()))
        }
        fn watermark(&self, _: WatermarkRequest) -> Result<PdfBuffer> {
            Err(Error::UnsupportedFile("nope".into()))
        }
        fn compress(&self, _: CompressRequest) -> Result<PdfBuffer> {
            panic!("compress panicked")
        }
        fn split(&self, _: SplitRequest) -> Result<PdfBuffer> {
            Err(Error::invalid_input("bad range"))
        }
    }

    #[tokio::test]
    async fn test_service_forwards_to_engine() {
        let service = ManipulationService::new(Arc::new(LopdfEngine));
        let request = SplitRequest::new(
            PdfBuffer::from(sample_pdf("S", 4)),
            PageRange::new(2, 3).unwrap(),
        );

        let output = service.split(request).await.unwrap();
        assert_eq!(page_contents(output.as_bytes()).len(), 2);
    }

    #[tokio::test]
    async fn test_service_propagates_engine_errors() {
        let service = ManipulationService::new(Arc::new(FailingEngine));

        let merge = MergeRequest::new(vec![PdfBuffer::default()]).unwrap();
        assert_eq!(service.merge(merge).await.unwrap_err().kind(), ErrorKind::LibraryFailure);

        let watermark = WatermarkRequest::new(PdfBuffer::default(), "x").unwrap();
        assert_eq!(
            service.watermark(watermark).await.unwrap_err().kind(),
            ErrorKind::UnsupportedFile
        );
    }

    #[tokio::test]
    async fn test_panicking_engine_is_library_failure() {
        let service = ManipulationService::new(Arc::new(FailingEngine));
        let request = CompressRequest::new(PdfBuffer::default(), Default::default());

        let err = service.compress(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LibraryFailure);
        assert!(err.to_string().contains("compress task failed"));
    }
}
