//! HTTP error responses

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::{Error, ErrorKind};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Form field {field} is not an integer: {value:?}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("Expected a multipart/form-data body: {0}")]
    NotMultipart(#[from] MultipartRejection),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Pdf(#[from] Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::NotAnInteger { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotMultipart(e) => e.status(),
            ApiError::Multipart(e) => e.status(),
            ApiError::Pdf(e) => match e.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::UnsupportedFile => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ErrorKind::LibraryFailure => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!("PDF operation failed: {}", self);
            "PDF processing failed".to_string()
        } else {
            tracing::debug!("Rejected request: {}", self);
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingField("pdfFile").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(Error::invalid_input("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::UnsupportedFile("bad".into())).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ApiError::from(Error::General("bad".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_library_failure_response_status() {
        let response = ApiError::from(Error::General("secret path /tmp/x".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
