//! Pipeline stages for converting one batch of uploads.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and the converters can be swapped without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ classify ──▶ dispatch ──▶ (office | pandoc | image) ──▶ archive
//! (stage)    (category)   (strategy)    (external tool)              (zip if > 1)
//! ```
//!
//! 1. [`upload`]   — sanitize names and stage bytes in a per-batch temp dir
//! 2. [`dispatch`] — route a [`crate::category::Category`] to its [`dispatch::Converter`]
//! 3. [`office`], [`pandoc`], [`image`] — the tool-backed converters, all
//!    running their program through [`tool`]
//! 4. [`archive`]  — zip the outputs when a batch produced more than one

pub mod archive;
pub mod dispatch;
pub mod image;
pub mod office;
pub mod pandoc;
pub mod tool;
pub mod upload;
