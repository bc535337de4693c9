//! Error types for the edgequake-doc2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2PdfError`] — **Fatal**: the batch (or HTTP request) cannot produce
//!   anything at all (nothing uploaded, output directory unwritable, every
//!   file failed). Returned as `Err(Doc2PdfError)` from
//!   [`crate::batch::convert_batch`] and friends.
//!
//! * [`FileError`] — **Non-fatal**: a single file failed (unsupported
//!   extension, converter crashed, converter missing) while the rest of the
//!   batch is fine. Stored in [`crate::output::BatchOutput::failures`] so the
//!   caller can show per-file messages next to the download link.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doc2pdf library.
///
/// File-level failures use [`FileError`] and are carried in the batch output
/// rather than propagated here, except when *every* file failed.
#[derive(Debug, Error)]
pub enum Doc2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request carried no file, or only an unnamed empty file part.
    #[error("No file selected")]
    NoFiles,

    /// A `conversion_type` value that is not one of the known categories.
    #[error("Unknown conversion type '{value}'\nExpected one of: word, powerpoint, excel, text, image, markdown, pdf")]
    UnknownCategory { value: String },

    /// A download name containing path separators or traversal segments.
    #[error("Invalid file name '{name}'")]
    InvalidFilename { name: String },

    /// The requested download does not exist in the output directory.
    #[error("File not found: '{name}'")]
    NotFound { name: String },

    /// A local input file given to the CLI could not be read.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Batch errors ──────────────────────────────────────────────────────
    /// No file in the batch produced an output.
    #[error("All {total} files failed to convert.\nFirst error: {}", first_error(.failures))]
    AllFilesFailed {
        total: usize,
        failures: Vec<FileError>,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Upload or output directory could not be created.
    #[error("Directory '{path}' is unavailable: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An uploaded file could not be staged to disk.
    #[error("Failed to store upload '{path}': {source}")]
    UploadWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A converted file could not be moved into the output directory.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building the zip archive failed.
    #[error("Failed to build archive '{path}': {detail}")]
    ArchiveFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn first_error(failures: &[FileError]) -> String {
    failures
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "Unknown error".to_string())
}

impl Doc2PdfError {
    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Doc2PdfError::NoFiles => "no_files",
            Doc2PdfError::UnknownCategory { .. } => "unknown_category",
            Doc2PdfError::InvalidFilename { .. } => "invalid_filename",
            Doc2PdfError::NotFound { .. } => "not_found",
            Doc2PdfError::InputReadFailed { .. } => "input_read_failed",
            Doc2PdfError::AllFilesFailed { .. } => "all_files_failed",
            Doc2PdfError::DirectoryUnavailable { .. }
            | Doc2PdfError::UploadWriteFailed { .. }
            | Doc2PdfError::OutputWriteFailed { .. }
            | Doc2PdfError::ArchiveFailed { .. } => "storage_error",
            Doc2PdfError::InvalidConfig(_) => "invalid_config",
            Doc2PdfError::Internal(_) => "internal",
        }
    }
}

/// A non-fatal error for a single file of a batch.
///
/// The batch continues with the next file; the error is reported back to the
/// user alongside whatever did convert.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileError {
    /// Extension unknown, or not allowed for the selected conversion type.
    #[error("Unsupported file type: {filename}")]
    Unsupported { filename: String },

    /// The converter executable could not be found on `PATH`.
    #[error("Conversion failed for {filename}: '{tool}' is not installed or not on PATH")]
    ToolMissing { filename: String, tool: String },

    /// The converter ran and exited unsuccessfully.
    #[error("Conversion failed for {filename}: {tool} exited with {status}: {stderr}")]
    ToolFailed {
        filename: String,
        tool: String,
        status: String,
        stderr: String,
    },

    /// The converter did not finish within the configured timeout.
    #[error("Conversion failed for {filename}: {tool} timed out after {secs}s")]
    Timeout {
        filename: String,
        tool: String,
        secs: u64,
    },

    /// The converter reported success but produced no output file.
    #[error("Conversion failed for {filename}: {tool} produced no output (expected '{expected}')")]
    OutputMissing {
        filename: String,
        tool: String,
        expected: String,
    },

    /// The image could not be decoded or prepared for embedding.
    #[error("Conversion failed for {filename}: {detail}")]
    ImageRejected { filename: String, detail: String },

    /// Local I/O failed while preparing or collecting this file.
    #[error("Conversion failed for {filename}: {detail}")]
    Io { filename: String, detail: String },
}

impl FileError {
    /// The user-facing name of the file this error refers to.
    pub fn filename(&self) -> &str {
        match self {
            FileError::Unsupported { filename }
            | FileError::ToolMissing { filename, .. }
            | FileError::ToolFailed { filename, .. }
            | FileError::Timeout { filename, .. }
            | FileError::OutputMissing { filename, .. }
            | FileError::ImageRejected { filename, .. }
            | FileError::Io { filename, .. } => filename,
        }
    }
}
