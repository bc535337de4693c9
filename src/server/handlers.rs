//! Request handlers.

use super::error::ApiError;
use super::page::{self, PageView};
use super::AppState;
use crate::batch::convert_batch_with;
use crate::category::Category;
use crate::error::{Doc2PdfError, FileError};
use crate::output::{BatchOutput, BatchStats, ConvertedFile};
use crate::pipeline::upload::{is_safe_filename, Upload};
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

/// JSON answer of `POST /api/convert`.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub download_url: String,
    pub filename: String,
    pub archived: bool,
    pub converted: Vec<ConvertedFile>,
    pub failures: Vec<FileError>,
    pub stats: BatchStats,
}

impl From<BatchOutput> for BatchReport {
    fn from(output: BatchOutput) -> Self {
        let filename = output.download_name();
        Self {
            download_url: download_url(&filename),
            archived: output.artifact.is_archive(),
            filename,
            converted: output.converted,
            failures: output.failures,
            stats: output.stats,
        }
    }
}

fn download_url(filename: &str) -> String {
    format!("/download/{filename}")
}

/// The parsed upload form.
#[derive(Debug, Default)]
pub struct Submission {
    /// Every `file` part, in form order. Empty parts are kept; the batch
    /// coordinator drops them.
    pub uploads: Vec<Upload>,
    /// `conversion_type`; `None` when missing, empty or `auto`.
    pub conversion_type: Option<Category>,
}

/// Read the `file` parts and the optional `conversion_type` field.
pub async fn read_submission(mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut submission = Submission::default();
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
                let data = field.bytes().await?;
                submission.uploads.push(Upload::new(filename, data));
            }
            "conversion_type" => {
                let value = field.text().await?;
                let value = value.trim();
                if !value.is_empty() && !value.eq_ignore_ascii_case("auto") {
                    submission.conversion_type = Some(value.parse::<Category>()?);
                }
            }
            _ => {}
        }
    }
    Ok(submission)
}

async fn run_batch(
    state: &AppState,
    multipart: Multipart,
) -> Result<(BatchOutput, Option<Category>), ApiError> {
    let submission = read_submission(multipart).await?;
    let output = convert_batch_with(
        submission.uploads,
        submission.conversion_type,
        &state.dispatcher,
        &state.config,
    )
    .await?;
    Ok((output, submission.conversion_type))
}

fn render_page(state: &AppState, status: StatusCode, view: &PageView) -> Response {
    match page::render(state.templates(), view) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Failed to render upload page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

/// `GET /`
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    render_page(&state, StatusCode::OK, &PageView::default())
}

/// `POST /`: convert and show the form again with a download link.
pub async fn upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match run_batch(&state, multipart).await {
        Ok((output, selected)) => {
            let name = output.download_name();
            let view = PageView {
                messages: output.failures.iter().map(|f| f.to_string()).collect(),
                download_url: Some(download_url(&name)),
                download_name: Some(name),
                archived: output.artifact.is_archive(),
                selected: selected.map(Category::as_str),
            };
            render_page(&state, StatusCode::OK, &view)
        }
        Err(err) => {
            let view = PageView {
                messages: err.messages(),
                ..PageView::default()
            };
            render_page(&state, err.status, &view)
        }
    }
}

/// `POST /api/convert`
pub async fn api_convert(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<BatchReport>, ApiError> {
    let (output, _) = run_batch(&state, multipart).await?;
    Ok(Json(BatchReport::from(output)))
}

/// `GET /download/{filename}`: stream an artifact as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !is_safe_filename(&filename) {
        return Err(Doc2PdfError::InvalidFilename { name: filename }.into());
    }

    let path = state.config.output_dir.join(&filename);
    let not_found = || Doc2PdfError::NotFound {
        name: filename.clone(),
    };
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found().into()),
        Err(e) => {
            return Err(
                Doc2PdfError::Internal(format!("cannot open '{}': {e}", path.display())).into(),
            )
        }
    };
    let metadata = file
        .metadata()
        .await
        .map_err(|e| Doc2PdfError::Internal(format!("cannot stat '{}': {e}", path.display())))?;
    if !metadata.is_file() {
        return Err(not_found().into());
    }

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    info!("Serving {} ({} bytes, {})", filename, metadata.len(), mime);

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_LENGTH, metadata.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| Doc2PdfError::Internal(format!("cannot build response: {e}")).into())
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
