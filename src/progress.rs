//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the batch coordinator works through each uploaded file. The CLI
//! drives a terminal progress bar from it; library users can forward the
//! events wherever they like.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2pdf::{BatchProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     converted: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, filename: &str) {
//!         self.converted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} done", index, total, filename);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { converted: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch coordinator as it processes each file.
///
/// Files are processed one at a time, but the callback may be shared between
/// concurrent batches (e.g. several HTTP requests), hence `Send + Sync`.
/// All methods have default no-op implementations.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first file is staged.
    ///
    /// # Arguments
    /// * `total_files` — number of files submitted
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is classified and dispatched.
    ///
    /// # Arguments
    /// * `index`    — 1-indexed position in the batch
    /// * `total`    — number of files in the batch
    /// * `filename` — sanitized file name
    fn on_file_start(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called when a file converted successfully.
    fn on_file_complete(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called when a file was rejected or its converter failed.
    ///
    /// # Arguments
    /// * `error` — the user-facing message for this file
    fn on_file_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every file has been attempted.
    ///
    /// # Arguments
    /// * `total_files`   — files in the batch
    /// * `success_count` — files that produced an output
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
