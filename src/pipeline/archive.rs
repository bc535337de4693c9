//! Zip packaging of multi-file batch results.

use crate::error::Doc2PdfError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Name for a fresh batch archive: `converted_<32 hex chars>.zip`.
pub fn archive_name() -> String {
    format!("converted_{}.zip", Uuid::new_v4().simple())
}

/// Bundle `files` into a new zip inside `out_dir` and return its path.
///
/// Each file is stored under its base name. The archive is written to a
/// `.tmp` sibling and renamed into place, so a download link never points at
/// a half-written zip.
pub async fn bundle(files: &[PathBuf], out_dir: &Path) -> Result<PathBuf, Doc2PdfError> {
    let path = out_dir.join(archive_name());
    let files = files.to_vec();
    let target = path.clone();

    tokio::task::spawn_blocking(move || write_zip_atomic(&files, &target))
        .await
        .map_err(|e| Doc2PdfError::Internal(format!("Archive task panicked: {e}")))??;

    info!("Bundled archive {}", path.display());
    Ok(path)
}

fn write_zip_atomic(files: &[PathBuf], path: &Path) -> Result<(), Doc2PdfError> {
    let tmp = path.with_extension("zip.tmp");
    let result = write_zip(files, &tmp).and_then(|()| {
        std::fs::rename(&tmp, path).map_err(|e| Doc2PdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    });
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn write_zip(files: &[PathBuf], path: &Path) -> Result<(), Doc2PdfError> {
    let failed = |detail: String| Doc2PdfError::ArchiveFailed {
        path: path.to_path_buf(),
        detail,
    };

    let file = File::create(path).map_err(|e| Doc2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for source in files {
        let entry = entry_name(source);
        zip.start_file(entry.as_str(), options)
            .map_err(|e| failed(format!("cannot add '{entry}': {e}")))?;
        let mut input = File::open(source)
            .map_err(|e| failed(format!("cannot read '{}': {e}", source.display())))?;
        std::io::copy(&mut input, &mut zip)
            .map_err(|e| failed(format!("cannot write '{entry}': {e}")))?;
        debug!("Archived {}", entry);
    }

    let mut writer = zip
        .finish()
        .map_err(|e| failed(format!("cannot finalise archive: {e}")))?;
    writer
        .flush()
        .map_err(|e| failed(format!("cannot flush archive: {e}")))?;
    Ok(())
}

/// Base name of `path`, used as the zip entry name.
fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string())
}
