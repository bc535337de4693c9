//! Routing: pick the converter for a file's category and run it.
//!
//! The routing table is deliberately tiny. Each [`Category`] maps to one
//! [`Strategy`], and each strategy is served by one [`Converter`]:
//!
//! | Category | Strategy | Output |
//! |----------|----------|--------|
//! | word, powerpoint, excel, text | [`Strategy::Office`] (LibreOffice) | pdf |
//! | markdown | [`Strategy::Pandoc`] | pdf |
//! | image | [`Strategy::Image`] (img2pdf) | pdf |
//! | pdf | [`Strategy::Office`] (PDF import filter) | docx |
//!
//! Converters sit behind a trait object so the batch coordinator never knows
//! which program runs, and so tests can swap in fakes.

use crate::category::Category;
use crate::config::ConversionConfig;
use crate::error::FileError;
use crate::pipeline::image::ImageConverter;
use crate::pipeline::office::OfficeConverter;
use crate::pipeline::pandoc::PandocConverter;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// How a category gets converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// LibreOffice in headless mode.
    Office,
    /// Pandoc with a LaTeX (or configured) PDF engine.
    Pandoc,
    /// img2pdf, after flattening transparency.
    Image,
}

impl Strategy {
    /// The default routing table.
    pub fn for_category(category: Category) -> Strategy {
        match category {
            Category::Word
            | Category::Powerpoint
            | Category::Excel
            | Category::Text
            | Category::Pdf => Strategy::Office,
            Category::Markdown => Strategy::Pandoc,
            Category::Image => Strategy::Image,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Office => "office",
            Strategy::Pandoc => "pandoc",
            Strategy::Image => "image",
        })
    }
}

/// One file to convert.
#[derive(Debug, Clone, Copy)]
pub struct Job<'a> {
    /// Staged input file.
    pub input: &'a Path,
    /// User-facing file name, for messages.
    pub name: &'a str,
    pub category: Category,
    /// Empty directory the converter may write into.
    pub out_dir: &'a Path,
}

impl Job<'_> {
    /// `<out_dir>/<input stem>.<category output extension>`.
    pub fn output_path(&self) -> PathBuf {
        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "output".into());
        let mut file = stem;
        file.push(".");
        file.push(self.category.output_extension());
        self.out_dir.join(file)
    }
}

/// An external conversion tool.
///
/// Contract: given a staged input file, write exactly one converted file into
/// `job.out_dir` (normally [`Job::output_path`]) and return its path. Tool
/// failures come back as [`FileError`]; they never abort the batch.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn convert(&self, job: &Job<'_>) -> Result<PathBuf, FileError>;
}

/// Maps each [`Strategy`] to the converter that serves it.
#[derive(Clone)]
pub struct Dispatcher {
    office: Arc<dyn Converter>,
    pandoc: Arc<dyn Converter>,
    image: Arc<dyn Converter>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("office", &self.office.name())
            .field("pandoc", &self.pandoc.name())
            .field("image", &self.image.name())
            .finish()
    }
}

impl Dispatcher {
    /// Tool-backed converters configured from `config`.
    pub fn from_config(config: &ConversionConfig) -> Self {
        let timeout = config.tool_timeout();
        Self {
            office: Arc::new(OfficeConverter::new(&config.soffice_path, timeout)),
            pandoc: Arc::new(PandocConverter::new(
                &config.pandoc_path,
                config.pdf_engine.clone(),
                timeout,
            )),
            image: Arc::new(ImageConverter::new(&config.img2pdf_path, timeout)),
        }
    }

    /// Replace the converter serving `strategy`.
    pub fn with_converter(mut self, strategy: Strategy, converter: Arc<dyn Converter>) -> Self {
        match strategy {
            Strategy::Office => self.office = converter,
            Strategy::Pandoc => self.pandoc = converter,
            Strategy::Image => self.image = converter,
        }
        self
    }

    pub fn converter(&self, strategy: Strategy) -> &Arc<dyn Converter> {
        match strategy {
            Strategy::Office => &self.office,
            Strategy::Pandoc => &self.pandoc,
            Strategy::Image => &self.image,
        }
    }

    /// The converter responsible for `category`.
    pub fn converter_for(&self, category: Category) -> &Arc<dyn Converter> {
        self.converter(Strategy::for_category(category))
    }

    /// Run the right converter for `job`.
    pub async fn dispatch(&self, job: &Job<'_>) -> Result<PathBuf, FileError> {
        let converter = self.converter_for(job.category);
        debug!(
            "Dispatching {} ({}) to {}",
            job.name,
            job.category,
            converter.name()
        );
        converter.convert(job).await
    }
}
