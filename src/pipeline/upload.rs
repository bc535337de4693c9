//! Upload staging: write submitted bytes to uniquely named local files.
//!
//! ## Why a per-batch temp directory?
//!
//! External converters need a file-system path. Each batch gets a `TempDir`
//! inside the configured upload directory; staged uploads and intermediate
//! converter output live there and are deleted when the [`StagingArea`] is
//! dropped, even if the batch errors out or panics.

use crate::error::{Doc2PdfError, FileError};
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use uuid::Uuid;

const MAX_FILENAME_LENGTH: usize = 255;

/// Longest sanitized name. Staged files are `<uuid>_<name>` (37 extra bytes)
/// and a PDF's output swaps `.pdf` for `.docx`.
const MAX_NAME_LENGTH: usize = MAX_FILENAME_LENGTH - 37 - 1;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());

/// A file as submitted by a caller: its client-side name and its content.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Read a local file into an upload, keeping only its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Doc2PdfError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| Doc2PdfError::InputReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, data))
    }
}

/// An upload written to the staging area under a unique name.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    /// Sanitized client file name, used in messages and for classification.
    pub name: String,
    /// `<uuid>_<name>` inside the staging area.
    pub path: PathBuf,
}

/// Per-batch scratch directory; removed on drop.
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a fresh staging directory inside `upload_dir`, creating
    /// `upload_dir` first if needed.
    pub async fn create(upload_dir: &Path) -> Result<Self, Doc2PdfError> {
        tokio::fs::create_dir_all(upload_dir)
            .await
            .map_err(|e| Doc2PdfError::DirectoryUnavailable {
                path: upload_dir.to_path_buf(),
                source: e,
            })?;
        let dir = tempfile::Builder::new()
            .prefix("batch-")
            .tempdir_in(upload_dir)
            .map_err(|e| Doc2PdfError::DirectoryUnavailable {
                path: upload_dir.to_path_buf(),
                source: e,
            })?;
        debug!("Staging area: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `upload` into the staging area under a unique name.
    pub async fn stage(&self, upload: &Upload) -> Result<StagedUpload, FileError> {
        let name = sanitize_filename(&upload.filename);
        let path = self.path().join(unique_name(&name));
        tokio::fs::write(&path, &upload.data)
            .await
            .map_err(|e| FileError::Io {
                filename: name.clone(),
                detail: format!("failed to store upload: {e}"),
            })?;
        debug!("Staged {} ({} bytes) at {}", name, upload.data.len(), path.display());
        Ok(StagedUpload { name, path })
    }

    /// A private directory for one converter invocation.
    pub async fn scratch_dir(&self, label: &str) -> Result<PathBuf, FileError> {
        let dir = self.path().join(format!("{label}-{}", Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| FileError::Io {
                filename: label.to_string(),
                detail: format!("failed to create scratch directory: {e}"),
            })?;
        Ok(dir)
    }
}

/// Whether `name` could have come out of [`sanitize_filename`]: a plain,
/// non-hidden base name made of `[A-Za-z0-9._-]`.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_FILENAME_LENGTH
        && !name.starts_with('.')
        && !UNSAFE_CHARS.is_match(name)
}

/// Prefix `name` with a random UUID so concurrent uploads never collide.
pub fn unique_name(name: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), name)
}

/// Reduce a client-supplied file name to a safe base name.
///
/// Directory components (`/` or `\`) are dropped, every character outside
/// `[A-Za-z0-9._-]` becomes `_`, leading dots and underscores are stripped so
/// the result is never hidden or a traversal segment, and an empty result
/// falls back to `"file"`. Long names lose the end of their stem; the
/// extension is kept.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let base = base.replace(' ', "_");
    let replaced = UNSAFE_CHARS.replace_all(&base, "_");
    let trimmed = replaced.trim_start_matches(['.', '_']);
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        truncate_stem(trimmed, MAX_NAME_LENGTH)
    }
}

// `name` is ASCII here, so byte offsets are char boundaries.
fn truncate_stem(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    match name.rfind('.') {
        Some(dot) if name.len() - dot < max => {
            let ext = &name[dot..];
            format!("{}{}", &name[..max - ext.len()], ext)
        }
        _ => name[..max].to_string(),
    }
}
