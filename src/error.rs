//! Error types for the skid labeler library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the skid labeler library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Folder watch error
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// No page in the document carried a valid dock code and order number.
    /// The source document is left untouched so it can be inspected manually.
    #[error("No page validated in document: {}", .0.display())]
    NoValidPages(PathBuf),

    /// A caller bug: the numbering engine was queried with a page index
    /// that is not a member of the claimed group
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No PDF files found matching pattern: {0}")]
    NoFilesMatched(String),

    /// General error
    #[error("{0}")]
    General(String),
}
