//! PDF Converter Library
//!
//! A small web API and library for manipulating PDF documents in memory.
//! This library provides functionality to:
//! - Merge multiple PDFs in a given order
//! - Overlay a text watermark on every page
//! - Recompress a PDF at a level from 0 (none) to 9 (maximum)
//! - Extract an inclusive page range into a new PDF
//!
//! # Example
//!
//! ```no_run
//! use pdf_converter::engine::{LopdfEngine, PdfEngine};
//! use pdf_converter::request::{MergeRequest, PdfBuffer};
//!
//! let first = PdfBuffer::from(std::fs::read("1. intro.pdf").unwrap());
//! let second = PdfBuffer::from(std::fs::read("2. advanced.pdf").unwrap());
//!
//! let request = MergeRequest::new(vec![first, second]).expect("at least one file");
//! let merged = LopdfEngine.merge(request).expect("Failed to merge PDFs");
//! std::fs::write("merged.pdf", merged.as_bytes()).unwrap();
//! ```

pub mod engine;
pub mod error;
pub mod pdf;
pub mod request;
pub mod server;
pub mod service;

// Re-export commonly used items
pub use engine::{LopdfEngine, PdfEngine};
pub use error::{Error, ErrorKind, Result};
pub use request::PdfBuffer;
