//! Error types for the PDF converter library

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of a failure, used to pick an HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed parameters (bad page range, level out of bounds, empty text)
    InvalidInput,
    /// The uploaded bytes are not a PDF we can work with
    UnsupportedFile,
    /// The PDF library failed for any other reason
    LibraryFailure,
}

/// Main error type for the PDF converter library
#[derive(Error, Debug)]
pub enum Error {
    /// Request parameters violate an operation's preconditions
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input could not be parsed as a usable PDF
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// General library failure
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    /// Category of this error; IO and lopdf failures count as library failures
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::UnsupportedFile(_) => ErrorKind::UnsupportedFile,
            Error::Pdf(_) | Error::Io(_) | Error::General(_) => ErrorKind::LibraryFailure,
        }
    }
}
