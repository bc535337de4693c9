//! Pandoc converter for Markdown input.

use crate::error::FileError;
use crate::pipeline::dispatch::{Converter, Job};
use crate::pipeline::tool::ToolRun;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct PandocConverter {
    program: PathBuf,
    pdf_engine: Option<String>,
    timeout: Duration,
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>, pdf_engine: Option<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            pdf_engine,
            timeout,
        }
    }
}

pub(crate) fn pandoc_args(
    job: &Job<'_>,
    output: &Path,
    pdf_engine: Option<&str>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        job.input.into(),
        "--from=markdown".into(),
        "--standalone".into(),
        "-o".into(),
        output.into(),
    ];
    if let Some(engine) = pdf_engine {
        args.push(format!("--pdf-engine={engine}").into());
    }
    args
}

#[async_trait]
impl Converter for PandocConverter {
    fn name(&self) -> &'static str {
        "pandoc"
    }

    async fn convert(&self, job: &Job<'_>) -> Result<PathBuf, FileError> {
        let output = job.output_path();
        let run = ToolRun {
            tool: self.name(),
            program: &self.program,
            filename: job.name,
            timeout: self.timeout,
        };
        run.run(pandoc_args(job, &output, self.pdf_engine.as_deref()))
            .await?;
        run.expect_output(&output).await?;
        Ok(output)
    }
}
