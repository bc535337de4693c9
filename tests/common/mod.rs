//! Fake converters shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_doc2pdf::{
    Category, ConversionConfig, Converter, Dispatcher, FileError, Job, Strategy,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Writes `<converter name>:<staged file name>` to the expected output path.
/// Files whose name contains `fail_marker` fail like a crashing tool.
pub struct FakeConverter {
    pub name: &'static str,
    pub fail_marker: Option<&'static str>,
    pub calls: Mutex<Vec<(String, Category)>>,
}

impl FakeConverter {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail_marker: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_on(name: &'static str, marker: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail_marker: Some(marker),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, Category)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Converter for FakeConverter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn convert(&self, job: &Job<'_>) -> Result<PathBuf, FileError> {
        self.calls
            .lock()
            .unwrap()
            .push((job.name.to_string(), job.category));
        if let Some(marker) = self.fail_marker {
            if job.name.contains(marker) {
                return Err(FileError::ToolFailed {
                    filename: job.name.to_string(),
                    tool: self.name.to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "simulated failure".to_string(),
                });
            }
        }
        let output = job.output_path();
        tokio::fs::write(&output, format!("{}:{}", self.name, job.name))
            .await
            .map_err(|e| FileError::Io {
                filename: job.name.to_string(),
                detail: e.to_string(),
            })?;
        Ok(output)
    }
}

/// The three fakes behind one dispatcher.
pub struct Fakes {
    pub office: Arc<FakeConverter>,
    pub pandoc: Arc<FakeConverter>,
    pub image: Arc<FakeConverter>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            office: FakeConverter::new("office"),
            pandoc: FakeConverter::new("pandoc"),
            image: FakeConverter::new("image"),
        }
    }

    pub fn dispatcher(&self, config: &ConversionConfig) -> Dispatcher {
        Dispatcher::from_config(config)
            .with_converter(Strategy::Office, self.office.clone())
            .with_converter(Strategy::Pandoc, self.pandoc.clone())
            .with_converter(Strategy::Image, self.image.clone())
    }
}

/// Config rooted in `dir`, with `uploads/` and `outputs/` beneath it.
pub fn config_in(dir: &Path) -> ConversionConfig {
    ConversionConfig::builder()
        .upload_dir(dir.join("uploads"))
        .output_dir(dir.join("outputs"))
        .build()
        .unwrap()
}

/// Number of entries directly inside `dir` (0 when it does not exist).
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
