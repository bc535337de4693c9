//! Configuration types for document conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The web server and the CLI both map
//! their flags onto this one struct, so a batch behaves the same whichever
//! front end submitted it.

use crate::error::Doc2PdfError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a conversion batch.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .output_dir("/srv/doc2pdf/outputs")
///     .tool_timeout_secs(300)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory in which each batch creates its private staging area. Default: `uploads`.
    ///
    /// Uploaded files and intermediate converter output live in a temporary
    /// sub-directory that is removed when the batch ends.
    pub upload_dir: PathBuf,

    /// Directory holding finished artifacts available for download. Default: `outputs`.
    pub output_dir: PathBuf,

    /// LibreOffice executable used for Word, PowerPoint, Excel, text and PDF input. Default: `soffice`.
    pub soffice_path: PathBuf,

    /// Pandoc executable used for Markdown input. Default: `pandoc`.
    pub pandoc_path: PathBuf,

    /// img2pdf executable used for image input. Default: `img2pdf`.
    pub img2pdf_path: PathBuf,

    /// PDF engine handed to pandoc (`--pdf-engine`). Default: None (pandoc's own default).
    pub pdf_engine: Option<String>,

    /// Per-file converter timeout in seconds. Default: 120.
    ///
    /// LibreOffice occasionally hangs on malformed input; the child process
    /// is killed when the timeout fires and the file is reported as failed.
    pub tool_timeout_secs: u64,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            soffice_path: PathBuf::from("soffice"),
            pandoc_path: PathBuf::from("pandoc"),
            img2pdf_path: PathBuf::from("img2pdf"),
            pdf_engine: None,
            tool_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("upload_dir", &self.upload_dir)
            .field("output_dir", &self.output_dir)
            .field("soffice_path", &self.soffice_path)
            .field("pandoc_path", &self.pandoc_path)
            .field("img2pdf_path", &self.img2pdf_path)
            .field("pdf_engine", &self.pdf_engine)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The converter timeout as a [`Duration`].
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn soffice_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.soffice_path = path.into();
        self
    }

    pub fn pandoc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = path.into();
        self
    }

    pub fn img2pdf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.img2pdf_path = path.into();
        self
    }

    pub fn pdf_engine(mut self, engine: impl Into<String>) -> Self {
        self.config.pdf_engine = Some(engine.into());
        self
    }

    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout_secs = secs;
        self
    }

    /// Receive per-file events as the batch runs.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Doc2PdfError> {
        let c = &self.config;
        if c.tool_timeout_secs == 0 {
            return Err(Doc2PdfError::InvalidConfig(
                "Tool timeout must be ≥ 1 second".into(),
            ));
        }
        if c.upload_dir.as_os_str().is_empty() || c.output_dir.as_os_str().is_empty() {
            return Err(Doc2PdfError::InvalidConfig(
                "Upload and output directories must not be empty".into(),
            ));
        }
        for (name, path) in [
            ("soffice", &c.soffice_path),
            ("pandoc", &c.pandoc_path),
            ("img2pdf", &c.img2pdf_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(Doc2PdfError::InvalidConfig(format!(
                    "Path to {name} must not be empty"
                )));
            }
        }
        if matches!(c.pdf_engine.as_deref(), Some(e) if e.trim().is_empty()) {
            return Err(Doc2PdfError::InvalidConfig(
                "PDF engine must not be blank".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.upload_dir, PathBuf::from("uploads"));
        assert_eq!(c.output_dir, PathBuf::from("outputs"));
        assert_eq!(c.tool_timeout(), Duration::from_secs(120));
        assert!(c.pdf_engine.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let c = ConversionConfig::builder()
            .upload_dir("/tmp/in")
            .output_dir("/tmp/out")
            .soffice_path("/opt/libreoffice/program/soffice")
            .pdf_engine("xelatex")
            .tool_timeout_secs(30)
            .build()
            .unwrap();
        assert_eq!(c.upload_dir, PathBuf::from("/tmp/in"));
        assert_eq!(c.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(
            c.soffice_path,
            PathBuf::from("/opt/libreoffice/program/soffice")
        );
        assert_eq!(c.pdf_engine.as_deref(), Some("xelatex"));
        assert_eq!(c.tool_timeout_secs, 30);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ConversionConfig::builder()
            .tool_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Doc2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn empty_tool_path_rejected() {
        let err = ConversionConfig::builder()
            .pandoc_path("")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("pandoc"), "got: {err}");
    }

    #[test]
    fn blank_pdf_engine_rejected() {
        assert!(ConversionConfig::builder().pdf_engine("  ").build().is_err());
    }
}
