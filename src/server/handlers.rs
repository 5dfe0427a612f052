//! HTTP handlers for the PDF routes
//!
//! Each handler reads the multipart form, builds the typed request (which
//! rejects bad parameters), forwards it to the service and streams the
//! resulting PDF back as a download.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use super::error::ApiError;
use super::AppState;
use crate::request::{
    CompressRequest, CompressionLevel, MergeRequest, PageRange, PdfBuffer, SplitRequest,
    WatermarkRequest,
};

/// Form field names accepted by the routes
pub mod fields {
    pub const PDF_FILES: &str = "pdfFiles";
    pub const PDF_FILE: &str = "pdfFile";
    pub const WATERMARK_TEXT: &str = "watermarkText";
    pub const COMPRESSION_LEVEL: &str = "compressionLevel";
    pub const START_PAGE: &str = "startPage";
    pub const END_PAGE: &str = "endPage";
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /api/pdf/merge`
pub async fn merge(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart?).await?;

    let request = MergeRequest::new(form.take_files(fields::PDF_FILES))?;
    let merged = state.service.merge(request).await?;

    Ok(pdf_response(merged, "merged.pdf"))
}

/// `POST /api/pdf/watermark`
pub async fn watermark(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart?).await?;

    let file = form.take_file(fields::PDF_FILE)?;
    let text = form.text(fields::WATERMARK_TEXT)?;
    let request = WatermarkRequest::new(file, text)?;
    let watermarked = state.service.watermark(request).await?;

    Ok(pdf_response(watermarked, "watermarked.pdf"))
}

/// `POST /api/pdf/compress`
pub async fn compress(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart?).await?;

    let file = form.take_file(fields::PDF_FILE)?;
    let level = CompressionLevel::new(form.integer(fields::COMPRESSION_LEVEL)?)?;
    let compressed = state.service.compress(CompressRequest::new(file, level)).await?;

    Ok(pdf_response(compressed, "compressed.pdf"))
}

/// `POST /api/pdf/split`
pub async fn split(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart?).await?;

    let file = form.take_file(fields::PDF_FILE)?;
    let range = PageRange::new(
        form.integer(fields::START_PAGE)?,
        form.integer(fields::END_PAGE)?,
    )?;
    let extracted = state.service.split(SplitRequest::new(file, range)).await?;

    Ok(pdf_response(extracted, "splited.pdf"))
}

/// 200 response carrying a PDF download
fn pdf_response(pdf: PdfBuffer, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        pdf.into_inner(),
    )
        .into_response()
}

/// A fully read multipart form
///
/// Parts with a filename, or named like one of our file fields, are kept as
/// bytes; everything else is read as text. Repeated file parts keep their
/// upload order.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<(String, Bytes)>,
    values: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            let is_file = field.file_name().is_some()
                || name == fields::PDF_FILE
                || name == fields::PDF_FILES;

            if is_file {
                let data = field.bytes().await?;
                form.files.push((name, data));
            } else {
                let value = field.text().await?;
                form.values.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Remove and return every file part with this name
    fn take_files(&mut self, name: &str) -> Vec<PdfBuffer> {
        let (matching, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.files).into_iter().partition(|(n, _)| n == name);
        self.files = rest;

        matching
            .into_iter()
            .map(|(_, data)| PdfBuffer::from(data.to_vec()))
            .collect()
    }

    /// Remove and return the first file part with this name
    fn take_file(&mut self, name: &'static str) -> Result<PdfBuffer, ApiError> {
        let index = self
            .files
            .iter()
            .position(|(n, _)| n == name)
            .ok_or(ApiError::MissingField(name))?;
        let (_, data) = self.files.remove(index);
        Ok(PdfBuffer::from(data.to_vec()))
    }

    fn text(&self, name: &'static str) -> Result<&str, ApiError> {
        self.values
            .get(name)
            .map(String::as_str)
            .ok_or(ApiError::MissingField(name))
    }

    fn integer(&self, name: &'static str) -> Result<i64, ApiError> {
        let value = self.text(name)?;
        value.trim().parse().map_err(|_| ApiError::NotAnInteger {
            field: name,
            value: value.to_string(),
        })
    }
}
