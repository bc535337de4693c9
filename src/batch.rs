//! Batch coordinator: convert every uploaded file, tolerate failures, and
//! hand back one downloadable artifact.
//!
//! Files are processed one after another. A file that is unsupported or
//! whose converter fails is recorded in [`BatchOutput::failures`] and the
//! batch moves on. Only when *nothing* converted does the batch itself fail
//! with [`Doc2PdfError::AllFilesFailed`].
//!
//! One output is returned as-is; two or more are bundled into a single zip.

use crate::category::{classify, is_allowed, Category};
use crate::config::ConversionConfig;
use crate::error::{Doc2PdfError, FileError};
use crate::output::{Artifact, BatchOutput, BatchStats, ConvertedFile};
use crate::pipeline::archive;
use crate::pipeline::dispatch::{Dispatcher, Job, Strategy};
use crate::pipeline::upload::{sanitize_filename, StagingArea, Upload};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a batch of uploads with the tool-backed converters from `config`.
///
/// # Arguments
/// * `uploads` — files as submitted
/// * `forced`  — conversion type chosen by the user; `None` classifies each
///   file by extension
/// * `config`  — directories, tool paths and timeouts
///
/// # Returns
/// `Ok(BatchOutput)` when at least one file converted, even if others failed
/// (check `output.failures`).
///
/// # Errors
/// Returns `Err(Doc2PdfError)` only for fatal errors:
/// - nothing was uploaded
/// - the upload or output directory is unusable
/// - every file failed
pub async fn convert_batch(
    uploads: Vec<Upload>,
    forced: Option<Category>,
    config: &ConversionConfig,
) -> Result<BatchOutput, Doc2PdfError> {
    let dispatcher = Dispatcher::from_config(config);
    convert_batch_with(uploads, forced, &dispatcher, config).await
}

/// Convert local files, e.g. from the command line.
pub async fn convert_paths(
    paths: &[PathBuf],
    forced: Option<Category>,
    dispatcher: &Dispatcher,
    config: &ConversionConfig,
) -> Result<BatchOutput, Doc2PdfError> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        uploads.push(Upload::from_path(path).await?);
    }
    convert_batch_with(uploads, forced, dispatcher, config).await
}

/// Like [`convert_batch`], with an explicit [`Dispatcher`].
pub async fn convert_batch_with(
    uploads: Vec<Upload>,
    forced: Option<Category>,
    dispatcher: &Dispatcher,
    config: &ConversionConfig,
) -> Result<BatchOutput, Doc2PdfError> {
    let start = Instant::now();

    // ── Step 1: Drop empty form parts ────────────────────────────────────
    // Browsers send one unnamed, empty part when no file was chosen.
    let uploads: Vec<Upload> = uploads
        .into_iter()
        .filter(|u| !(u.filename.is_empty() && u.data.is_empty()))
        .collect();
    if uploads.is_empty() {
        return Err(Doc2PdfError::NoFiles);
    }
    let total = uploads.len();
    info!(
        "Starting batch: {} file(s), conversion type {}",
        total,
        forced.map(|c| c.as_str()).unwrap_or("auto")
    );

    // ── Step 2: Prepare directories ──────────────────────────────────────
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| Doc2PdfError::DirectoryUnavailable {
            path: config.output_dir.clone(),
            source: e,
        })?;
    // Dropped at the end of this function: staged uploads and intermediate
    // outputs are removed whatever happens below.
    let staging = StagingArea::create(&config.upload_dir).await?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Step 3: Convert each file ────────────────────────────────────────
    let mut converted: Vec<ConvertedFile> = Vec::new();
    let mut outputs: Vec<PathBuf> = Vec::new();
    let mut failures: Vec<FileError> = Vec::new();

    for (i, upload) in uploads.iter().enumerate() {
        let index = i + 1;
        let display_name = sanitize_filename(&upload.filename);
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(index, total, &display_name);
        }

        match convert_one(&staging, upload, forced, dispatcher).await {
            Ok((file, path)) => {
                info!(
                    "[{}/{}] {} → {} via {}",
                    index, total, file.source, file.output, file.strategy
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(index, total, &file.source);
                }
                converted.push(file);
                outputs.push(path);
            }
            Err(e) => {
                warn!("[{}/{}] {}", index, total, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_error(index, total, &e.to_string());
                }
                failures.push(e);
            }
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, converted.len());
    }

    // ── Step 4: Nothing converted → fatal ────────────────────────────────
    if outputs.is_empty() {
        return Err(Doc2PdfError::AllFilesFailed { total, failures });
    }

    // ── Step 5: Publish one file, or zip several ─────────────────────────
    let artifact = if outputs.len() == 1 {
        let path = persist(&outputs[0], &config.output_dir).await?;
        Artifact::Single { path }
    } else {
        let path = archive::bundle(&outputs, &config.output_dir).await?;
        Artifact::Archive {
            path,
            entries: outputs.len(),
        }
    };
    drop(staging);

    let stats = BatchStats {
        total_files: total,
        converted_files: converted.len(),
        failed_files: failures.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Batch complete: {}/{} files converted, {}ms → {}",
        stats.converted_files,
        stats.total_files,
        stats.duration_ms,
        artifact.file_name()
    );

    Ok(BatchOutput {
        artifact,
        converted,
        failures,
        stats,
    })
}

/// Stage, classify and convert a single upload.
async fn convert_one(
    staging: &StagingArea,
    upload: &Upload,
    forced: Option<Category>,
    dispatcher: &Dispatcher,
) -> Result<(ConvertedFile, PathBuf), FileError> {
    let staged = staging.stage(upload).await?;

    let category = match forced.or_else(|| classify(&staged.name)) {
        Some(c) if is_allowed(&staged.name, Some(c)) => c,
        _ => {
            return Err(FileError::Unsupported {
                filename: staged.name,
            })
        }
    };
    debug!("{} classified as {}", staged.name, category);

    let out_dir = staging.scratch_dir("job").await?;
    let job = Job {
        input: &staged.path,
        name: &staged.name,
        category,
        out_dir: &out_dir,
    };
    let output = dispatcher.dispatch(&job).await?;

    let output_name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FileError::Io {
            filename: staged.name.clone(),
            detail: format!("converter returned an invalid path '{}'", output.display()),
        })?;

    Ok((
        ConvertedFile {
            source: staged.name.clone(),
            category,
            strategy: Strategy::for_category(category),
            output: output_name,
        },
        output,
    ))
}

/// Move `src` into `dir`, keeping its file name.
///
/// Falls back to copy + delete when the staging area and the output
/// directory are on different file systems.
async fn persist(src: &Path, dir: &Path) -> Result<PathBuf, Doc2PdfError> {
    let name = src
        .file_name()
        .ok_or_else(|| Doc2PdfError::Internal(format!("output without a file name: {}", src.display())))?;
    let dest = dir.join(name);
    if tokio::fs::rename(src, &dest).await.is_ok() {
        return Ok(dest);
    }
    tokio::fs::copy(src, &dest)
        .await
        .map_err(|e| Doc2PdfError::OutputWriteFailed {
            path: dest.clone(),
            source: e,
        })?;
    let _ = tokio::fs::remove_file(src).await;
    Ok(dest)
}
