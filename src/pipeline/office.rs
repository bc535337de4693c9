//! LibreOffice converter for office documents, plain text and PDF input.
//!
//! ## Why a private profile per call?
//!
//! `soffice` takes a lock on its user profile. Two conversions sharing the
//! default profile make the second one exit immediately with nothing
//! converted. Pointing `-env:UserInstallation` at a directory inside the
//! job's scratch dir lets concurrent requests convert side by side; the
//! profile disappears with the staging area.

use crate::category::Category;
use crate::error::FileError;
use crate::pipeline::dispatch::{Converter, Job};
use crate::pipeline::tool::ToolRun;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Writer filters for PDF → DOCX.
const DOCX_EXPORT: &str = "docx:MS Word 2007 XML";
const PDF_IMPORT: &str = "--infilter=writer_pdf_import";

pub struct OfficeConverter {
    program: PathBuf,
    timeout: Duration,
}

impl OfficeConverter {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

/// Build the `soffice` argument list for `job`.
pub(crate) fn office_args(job: &Job<'_>, profile_url: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--headless".into(),
        "--norestore".into(),
        format!("-env:UserInstallation={profile_url}").into(),
    ];
    let target = if job.category == Category::Pdf {
        args.push(PDF_IMPORT.into());
        DOCX_EXPORT
    } else {
        job.category.output_extension()
    };
    args.push("--convert-to".into());
    args.push(target.into());
    args.push("--outdir".into());
    args.push(job.out_dir.into());
    args.push(job.input.into());
    args
}

/// `file://` URL for a local directory, as LibreOffice expects it.
pub(crate) fn file_url(dir: &Path) -> String {
    let path = dir.to_string_lossy().replace('\\', "/");
    let encoded = path.replace('%', "%25").replace(' ', "%20");
    if encoded.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    }
}

#[async_trait]
impl Converter for OfficeConverter {
    fn name(&self) -> &'static str {
        "soffice"
    }

    async fn convert(&self, job: &Job<'_>) -> Result<PathBuf, FileError> {
        // soffice resolves the profile URL independently of our cwd.
        let out_dir = tokio::fs::canonicalize(job.out_dir)
            .await
            .map_err(|e| FileError::Io {
                filename: job.name.to_string(),
                detail: format!("scratch directory unavailable: {e}"),
            })?;
        let profile = out_dir.join("lo-profile");
        let job = Job {
            out_dir: &out_dir,
            ..*job
        };

        let run = ToolRun {
            tool: self.name(),
            program: &self.program,
            filename: job.name,
            timeout: self.timeout,
        };
        run.run(office_args(&job, &file_url(&profile))).await?;

        let output = job.output_path();
        run.expect_output(&output).await?;
        Ok(output)
    }
}
