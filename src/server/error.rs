//! HTTP error mapping.

use crate::error::{Doc2PdfError, FileError};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

/// Status code for a fatal conversion error.
pub fn status_for(err: &Doc2PdfError) -> StatusCode {
    match err {
        Doc2PdfError::NoFiles
        | Doc2PdfError::UnknownCategory { .. }
        | Doc2PdfError::InvalidFilename { .. }
        | Doc2PdfError::InputReadFailed { .. } => StatusCode::BAD_REQUEST,
        Doc2PdfError::NotFound { .. } => StatusCode::NOT_FOUND,
        Doc2PdfError::AllFilesFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Doc2PdfError::DirectoryUnavailable { .. }
        | Doc2PdfError::UploadWriteFailed { .. }
        | Doc2PdfError::OutputWriteFailed { .. }
        | Doc2PdfError::ArchiveFailed { .. }
        | Doc2PdfError::InvalidConfig(_)
        | Doc2PdfError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A request that could not be served, ready to be rendered as JSON or HTML.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    /// Per-file failures, set when every file in the batch failed.
    pub failures: Vec<FileError>,
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    pub code: &'a str,
    pub failures: &'a [FileError],
}

impl ApiError {
    /// Messages to show the user: the per-file ones if there are any,
    /// otherwise the error itself.
    pub fn messages(&self) -> Vec<String> {
        if self.failures.is_empty() {
            vec![self.message.clone()]
        } else {
            self.failures.iter().map(|f| f.to_string()).collect()
        }
    }
}

impl From<Doc2PdfError> for ApiError {
    fn from(err: Doc2PdfError) -> Self {
        let status = status_for(&err);
        let code = err.code();
        if status.is_server_error() {
            // Server-side failures carry local paths; keep those in the log.
            error!(error = %err, code, "Request failed");
            return ApiError {
                status,
                code,
                message: "The conversion service hit an internal error".to_string(),
                failures: Vec::new(),
            };
        }
        debug!(error = %err, code, "Request rejected");
        match err {
            Doc2PdfError::AllFilesFailed { failures, .. } => ApiError {
                status,
                code,
                message: "None of the files could be converted".to_string(),
                failures,
            },
            other => ApiError {
                status,
                code,
                message: other.to_string(),
                failures: Vec::new(),
            },
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        debug!(error = %err, "Malformed upload");
        ApiError {
            status: err.status(),
            code: "invalid_upload",
            message: err.body_text(),
            failures: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            code: self.code,
            failures: &self.failures,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn status_mapping() {
        assert_eq!(status_for(&Doc2PdfError::NoFiles), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&Doc2PdfError::NotFound { name: "x.pdf".into() }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&Doc2PdfError::AllFilesFailed {
                total: 1,
                failures: vec![]
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&Doc2PdfError::ArchiveFailed {
                path: PathBuf::from("/out/x.zip"),
                detail: "disk full".into()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn all_failed_keeps_per_file_messages() {
        let err: ApiError = Doc2PdfError::AllFilesFailed {
            total: 2,
            failures: vec![
                FileError::Unsupported {
                    filename: "a.exe".into(),
                },
                FileError::ToolMissing {
                    filename: "b.md".into(),
                    tool: "pandoc".into(),
                },
            ],
        }
        .into();
        assert_eq!(err.code, "all_files_failed");
        let messages = err.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "Unsupported file type: a.exe");
        assert!(messages[1].starts_with("Conversion failed for b.md"));
    }

    #[test]
    fn server_errors_hide_paths() {
        let err: ApiError = Doc2PdfError::OutputWriteFailed {
            path: PathBuf::from("/srv/secret/out.pdf"),
            source: std::io::Error::other("disk full"),
        }
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("/srv/secret"));
        assert_eq!(err.messages(), vec![err.message.clone()]);
    }
}
