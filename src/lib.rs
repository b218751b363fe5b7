//! # zpdf
//!
//! Safe Rust bindings for the zpdf native text-extraction engine.
//!
//! The engine is reached through a C ABI that hands out an opaque document
//! handle and engine-allocated buffers. This crate wraps that contract in a
//! [`Document`] that owns its handle, copies every buffer into owned values
//! and releases it on all paths, and turns native failure sentinels into a
//! typed [`Error`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use zpdf::{Document, ExtractMode};
//!
//! fn main() -> zpdf::Result<()> {
//!     let doc = Document::open("document.pdf")?;
//!     println!("Pages: {}", doc.page_count()?);
//!
//!     for page in &doc {
//!         println!("{}", page?);
//!     }
//!
//!     let text = doc.extract_all(ExtractMode::Parallel)?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```
//!
//! `Document::open` and `Document::from_bytes` require the `native`
//! feature, which links `libzpdf`. Without it, documents are opened against
//! any [`NativeApi`] provider, such as `mock::MockApi` from the `mock`
//! feature:
//!
//! ```
//! use zpdf::mock::MockApi;
//! use zpdf::Document;
//!
//! let data = MockApi::build_document(&["first page\n", "second page\n"]);
//! let doc = Document::from_bytes_with(MockApi::new(), &data)?;
//! assert_eq!(doc.page_count()?, 2);
//! # Ok::<(), zpdf::Error>(())
//! ```
//!
//! ## Features
//!
//! - **Deterministic release**: handles and buffers are released exactly once
//! - **Typed errors**: invalid documents, missing pages, failed extraction,
//!   and use after close are distinct variants
//! - **Parallel extraction**: delegated to the engine, same output as sequential
//! - **Positioned text**: spans with bounding boxes and font sizes

mod buffer;
pub mod document;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod model;
pub mod options;
pub mod sys;

// Re-export commonly used types
pub use document::{Document, Pages};
pub use error::{Error, ErrorKind, Result};
pub use model::{PageInfo, TextSpan};
pub use options::ExtractMode;
pub use sys::NativeApi;

#[cfg(feature = "native")]
pub use sys::LinkedApi;

use std::path::Path;

/// Open a file through `api` and extract all of its text.
///
/// # Example
///
/// ```
/// use zpdf::mock::MockApi;
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("doc.mock");
/// std::fs::write(&path, MockApi::build_document(&["a", "b"]))?;
///
/// let text = zpdf::extract_text_with(MockApi::new(), &path)?;
/// assert_eq!(text, "ab");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn extract_text_with<A: NativeApi, P: AsRef<Path>>(api: A, path: P) -> Result<String> {
    let doc = Document::open_with(api, path)?;
    doc.extract_text()
}

/// Extract all text from a PDF file with the linked engine.
///
/// # Example
///
/// ```no_run
/// let text = zpdf::extract_text("document.pdf").unwrap();
/// println!("{}", text);
/// ```
#[cfg(feature = "native")]
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    extract_text_with(LinkedApi, path)
}
