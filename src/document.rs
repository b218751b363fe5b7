//! Owned engine documents.
//!
//! A [`Document`] holds exactly one native handle from a successful open
//! until [`Document::close`] or drop, whichever comes first. Every
//! operation checks that the handle is still held before touching the
//! engine; buffers returned by the engine are copied into owned values and
//! released before the operation returns.

use std::ffi::CString;
use std::fmt;
use std::iter::FusedIterator;
use std::os::raw::c_int;
use std::path::Path;
use std::ptr::NonNull;

use crate::buffer::{NativeBuffer, NativeSpans};
use crate::error::{Error, Result};
use crate::model::{PageInfo, TextSpan};
use crate::options::ExtractMode;
use crate::sys::{NativeApi, RawDocument};

/// An open document of the zpdf engine.
///
/// `Document` is neither `Send` nor `Sync`: the engine makes no promise
/// about concurrent calls on one handle, so callers that need to share a
/// document across threads must serialize access themselves.
///
/// # Example
///
/// ```
/// use zpdf::mock::MockApi;
/// use zpdf::{Document, ExtractMode};
///
/// let data = MockApi::build_document(&["Hello\n", "World\n"]);
/// let mut doc = Document::from_bytes_with(MockApi::new(), &data)?;
///
/// assert_eq!(doc.page_count()?, 2);
/// assert_eq!(doc.extract_page(1)?, "World\n");
/// assert_eq!(doc.extract_all(ExtractMode::Sequential)?, "Hello\nWorld\n");
///
/// doc.close();
/// assert!(doc.page_count().is_err());
/// # Ok::<(), zpdf::Error>(())
/// ```
pub struct Document<A: NativeApi> {
    api: A,
    /// `None` once closed.
    handle: Option<NonNull<RawDocument>>,
}

impl<A: NativeApi> Document<A> {
    /// Open a document from a file path through `api`.
    pub fn open_with<P: AsRef<Path>>(api: A, path: P) -> Result<Self> {
        let path = path.as_ref();
        let c_path = path_to_cstring(path)?;
        // SAFETY: `c_path` is a valid NUL-terminated string for the call.
        let raw = unsafe { api.open(c_path.as_ptr()) };
        Self::adopt(api, raw, || format!("Failed to open PDF: {}", path.display()))
    }

    /// Open a document from an in-memory byte sequence through `api`.
    pub fn from_bytes_with(api: A, data: &[u8]) -> Result<Self> {
        // SAFETY: `data` is valid for reads of `data.len()` bytes for the call.
        let raw = unsafe { api.open_memory(data.as_ptr(), data.len()) };
        Self::adopt(api, raw, || {
            format!("Failed to open PDF from {} bytes of memory", data.len())
        })
    }

    fn adopt(api: A, raw: *mut RawDocument, describe: impl FnOnce() -> String) -> Result<Self> {
        match NonNull::new(raw) {
            Some(handle) => {
                log::debug!("Opened document handle {:p}", handle);
                Ok(Self {
                    api,
                    handle: Some(handle),
                })
            }
            None => {
                let message = describe();
                log::warn!("{}", message);
                Err(Error::InvalidDocument(message))
            }
        }
    }

    /// Release the native handle.
    ///
    /// Idempotent: closing an already closed document does nothing. Drop
    /// calls this as well, so an explicit close is never required.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::debug!("Closing document handle {:p}", handle);
            // SAFETY: the handle was taken out of `self`, so it is released once.
            unsafe { self.api.close(handle.as_ptr()) }
        }
    }

    /// Check whether the document has been closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// The provider this document was opened with.
    pub fn api(&self) -> &A {
        &self.api
    }

    fn handle(&self) -> Result<*mut RawDocument> {
        self.handle
            .map(NonNull::as_ptr)
            .ok_or(Error::UseAfterClose)
    }

    /// Number of pages in the document.
    ///
    /// The handle is immutable after opening, so the count is stable for
    /// the life of the document.
    pub fn page_count(&self) -> Result<usize> {
        let handle = self.handle()?;
        // SAFETY: `handle` is live while `self.handle` is `Some`.
        let count = unsafe { self.api.page_count(handle) };
        usize::try_from(count).map_err(|_| {
            log::warn!("Engine reported page count {}", count);
            Error::InvalidDocument("Failed to get page count".to_string())
        })
    }

    /// Same as [`page_count`](Self::page_count).
    pub fn len(&self) -> Result<usize> {
        self.page_count()
    }

    /// Check whether the document has no pages.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.page_count()? == 0)
    }

    /// Geometry of a page (zero-based).
    ///
    /// The index is validated by the engine; a rejected index is
    /// [`Error::PageNotFound`].
    pub fn page_info(&self, page: usize) -> Result<PageInfo> {
        let handle = self.handle()?;
        let index = native_index(page)?;

        let mut width = 0.0f64;
        let mut height = 0.0f64;
        let mut rotation: c_int = 0;
        // SAFETY: live handle and three writable output locations.
        let status = unsafe {
            self.api
                .get_page_info(handle, index, &mut width, &mut height, &mut rotation)
        };
        if status != 0 {
            log::warn!("Engine returned status {} for page {} info", status, page);
            return Err(Error::PageNotFound { page });
        }

        Ok(PageInfo::new(width, height, rotation))
    }

    /// Extract the text of one page (zero-based).
    ///
    /// The index is checked against [`page_count`](Self::page_count) before
    /// the engine is asked for text.
    pub fn extract_page(&self, page: usize) -> Result<String> {
        let handle = self.checked_page(page)?;
        let index = native_index(page)?;

        let mut len = 0usize;
        // SAFETY: live handle and a writable length location.
        let ptr = unsafe { self.api.extract_page(handle, index, &mut len) };
        // SAFETY: a non-null result is an unreleased buffer of `len` bytes.
        let buffer = unsafe { NativeBuffer::from_raw(&self.api, ptr, len) }.ok_or_else(|| {
            log::warn!("Engine returned no buffer for page {}", page);
            Error::ExtractionFailure(format!("Failed to extract page {}", page))
        })?;
        Ok(buffer.to_string_lossy())
    }

    /// Extract the text of the whole document.
    ///
    /// The result is the page texts concatenated in ascending page order,
    /// whichever `mode` is used; the mode only selects the engine entry
    /// point.
    pub fn extract_all(&self, mode: ExtractMode) -> Result<String> {
        let handle = self.handle()?;

        let mut len = 0usize;
        // SAFETY: live handle and a writable length location.
        let ptr = unsafe {
            match mode {
                ExtractMode::Sequential => self.api.extract_all(handle, &mut len),
                ExtractMode::Parallel => self.api.extract_all_parallel(handle, &mut len),
            }
        };
        // SAFETY: a non-null result is an unreleased buffer of `len` bytes.
        let buffer = unsafe { NativeBuffer::from_raw(&self.api, ptr, len) }.ok_or_else(|| {
            log::warn!("Engine returned no buffer for {} extraction", mode);
            Error::ExtractionFailure("Failed to extract text".to_string())
        })?;
        log::debug!("Extracted {} bytes ({} mode)", len, mode);
        Ok(buffer.to_string_lossy())
    }

    /// Extract the whole document with the default mode.
    pub fn extract_text(&self) -> Result<String> {
        self.extract_all(ExtractMode::default())
    }

    /// Extract positioned text spans of one page (zero-based).
    ///
    /// A page without text yields an empty vector. The engine signals that
    /// case with a null array and a zero count; a null array with any other
    /// count is a failure.
    pub fn extract_bounds(&self, page: usize) -> Result<Vec<TextSpan>> {
        let handle = self.checked_page(page)?;
        let index = native_index(page)?;

        let mut count = 0usize;
        // SAFETY: live handle and a writable count location.
        let ptr = unsafe { self.api.extract_bounds(handle, index, &mut count) };
        // SAFETY: a non-null result is an unreleased array of `count` spans.
        match unsafe { NativeSpans::from_raw(&self.api, ptr, count) } {
            Some(spans) => spans.to_text_spans(),
            None if count == 0 => Ok(Vec::new()),
            None => {
                log::warn!(
                    "Engine returned no span array with count {} for page {}",
                    count,
                    page
                );
                Err(Error::ExtractionFailure(format!(
                    "Failed to extract bounds for page {}",
                    page
                )))
            }
        }
    }

    /// Iterate over the text of every page in ascending order.
    ///
    /// Each call starts a fresh traversal.
    pub fn pages(&self) -> Pages<'_, A> {
        Pages {
            doc: self,
            next: 0,
            count: None,
            finished: false,
        }
    }

    fn checked_page(&self, page: usize) -> Result<*mut RawDocument> {
        let handle = self.handle()?;
        let count = self.page_count()?;
        if page >= count {
            return Err(Error::PageNotFound { page });
        }
        Ok(handle)
    }
}

#[cfg(feature = "native")]
impl Document<crate::sys::LinkedApi> {
    /// Open a PDF file with the linked engine.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(crate::sys::LinkedApi, path)
    }

    /// Open a PDF held in memory with the linked engine.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with(crate::sys::LinkedApi, data)
    }
}

impl<A: NativeApi> Drop for Document<A> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<A: NativeApi> fmt::Debug for Document<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("handle", &self.handle)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<'a, A: NativeApi> IntoIterator for &'a Document<A> {
    type Item = Result<String>;
    type IntoIter = Pages<'a, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages()
    }
}

/// Lazy iterator over page texts, created by [`Document::pages`].
///
/// The page count is read when iteration starts, then each page is
/// extracted with [`Document::extract_page`]. The first error is yielded
/// and ends the iteration.
pub struct Pages<'a, A: NativeApi> {
    doc: &'a Document<A>,
    next: usize,
    count: Option<usize>,
    finished: bool,
}

impl<A: NativeApi> Iterator for Pages<'_, A> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let count = match self.count {
            Some(count) => count,
            None => match self.doc.page_count() {
                Ok(count) => *self.count.insert(count),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            },
        };

        if self.next >= count {
            self.finished = true;
            return None;
        }

        let result = self.doc.extract_page(self.next);
        self.next += 1;
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match (self.finished, self.count) {
            (true, _) => (0, Some(0)),
            (false, Some(count)) => {
                let remaining = count.saturating_sub(self.next);
                (remaining.min(1), Some(remaining))
            }
            (false, None) => (0, None),
        }
    }
}

impl<A: NativeApi> FusedIterator for Pages<'_, A> {}

/// Convert a zero-based page index to the engine's `int`.
fn native_index(page: usize) -> Result<c_int> {
    c_int::try_from(page).map_err(|_| Error::PageNotFound { page })
}

/// Convert a path to the NUL-terminated byte string the engine expects.
fn path_to_cstring(path: &Path) -> Result<CString> {
    #[cfg(unix)]
    let bytes = {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    };
    #[cfg(not(unix))]
    let bytes = path
        .to_str()
        .ok_or_else(|| {
            Error::InvalidDocument(format!("Path is not valid UTF-8: {}", path.display()))
        })?
        .as_bytes()
        .to_vec();

    CString::new(bytes).map_err(|_| {
        Error::InvalidDocument(format!("Path contains a NUL byte: {}", path.display()))
    })
}
