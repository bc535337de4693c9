//! Result types returned by the batch coordinator.

use crate::category::Category;
use crate::error::FileError;
use crate::pipeline::dispatch::Strategy;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The downloadable result of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// Exactly one file converted; this is that file.
    Single { path: PathBuf },
    /// Several files converted; this zip holds all of them.
    Archive { path: PathBuf, entries: usize },
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Artifact::Single { path } | Artifact::Archive { path, .. } => path,
        }
    }

    /// Base name of the artifact, as used in `/download/{name}`.
    pub fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Artifact::Archive { .. })
    }
}

/// One successfully converted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedFile {
    /// Sanitized name of the uploaded file.
    pub source: String,
    pub category: Category,
    pub strategy: Strategy,
    /// Base name of the produced file (inside the archive, for multi-file batches).
    pub output: String,
}

/// Statistics for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Files submitted (after dropping empty form parts).
    pub total_files: usize,
    /// Files that produced an output.
    pub converted_files: usize,
    /// Files rejected or failed in their converter.
    pub failed_files: usize,
    /// Wall-clock time for the whole batch.
    pub duration_ms: u64,
}

/// Everything a caller needs after a batch: where to download, what
/// converted, and what did not.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    pub artifact: Artifact,
    pub converted: Vec<ConvertedFile>,
    /// Per-file failures; empty when every file converted.
    pub failures: Vec<FileError>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Name to put in the download link.
    pub fn download_name(&self) -> String {
        self.artifact.file_name()
    }
}
