//! # edgequake-doc2pdf
//!
//! Convert uploaded documents to PDF, and PDF back to Word, by driving the
//! converters that already do this well: LibreOffice, pandoc and img2pdf.
//!
//! ## Why this crate?
//!
//! Each converter handles only some formats, and each one fails in its own
//! way: a missing binary, a hung process, a zero-byte result. This crate puts
//! one routing table in front of them and treats a batch of files as a unit:
//! each file is classified by extension and sent to the right tool. A failing
//! file is reported but never stops the rest, and the result is one download.
//!
//! ## Pipeline Overview
//!
//! ```text
//! uploads
//!  │
//!  ├─ 1. Stage     sanitize names, write to a per-batch temp dir
//!  ├─ 2. Classify  extension → word / powerpoint / excel / text / image / markdown / pdf
//!  ├─ 3. Dispatch  LibreOffice | pandoc | img2pdf (one process per file, with timeout)
//!  ├─ 4. Collect   per-file failures kept, batch continues
//!  └─ 5. Publish   one output as-is, several zipped into converted_<id>.zip
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2pdf::{convert_batch, ConversionConfig, Upload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let uploads = vec![
//!         Upload::from_path("report.docx").await?,
//!         Upload::from_path("notes.md").await?,
//!     ];
//!     let output = convert_batch(uploads, None, &config).await?;
//!     println!("download: {}", output.artifact.path().display());
//!     for failure in &output.failures {
//!         eprintln!("{failure}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Routing
//!
//! | Category | Extensions | Converter | Output |
//! |----------|------------|-----------|--------|
//! | word | doc, docx | LibreOffice | pdf |
//! | powerpoint | ppt, pptx | LibreOffice | pdf |
//! | excel | xls, xlsx | LibreOffice | pdf |
//! | text | txt | LibreOffice | pdf |
//! | image | jpg, jpeg, png | img2pdf | pdf |
//! | markdown | md | pandoc | pdf |
//! | pdf | pdf | LibreOffice | docx |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-doc2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod category;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{convert_batch, convert_batch_with, convert_paths};
pub use category::{classify, is_allowed, Category};
pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use error::{Doc2PdfError, FileError};
pub use output::{Artifact, BatchOutput, BatchStats, ConvertedFile};
pub use pipeline::dispatch::{Converter, Dispatcher, Job, Strategy};
pub use pipeline::upload::Upload;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use server::{router, serve, AppState, ServerConfig};
