//! Raw native ABI of the zpdf engine.
//!
//! [`NativeApi`] mirrors the engine's C entry points one method per symbol.
//! [`Document`](crate::Document) is generic over it, so the lifecycle and
//! marshaling logic can run against `mock::MockApi` (behind the `mock`
//! feature) as well as the real library (`LinkedApi`, behind `native`).
//!
//! # Safety
//!
//! Every method is a direct boundary crossing. Callers must pass handles
//! obtained from `open`/`open_memory` of the same provider and not yet
//! closed, writable output locations, and must release each returned
//! buffer exactly once with the matching release call.

use std::marker::{PhantomData, PhantomPinned};
use std::os::raw::{c_char, c_int};
use std::sync::Arc;

/// Opaque engine document. Only ever used behind a pointer.
#[repr(C)]
pub struct RawDocument {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// One element of the array returned by `extract_bounds`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawTextSpan {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// UTF-8 bytes owned by the enclosing span array.
    pub text: *const u8,
    pub text_len: usize,
    pub font_size: f64,
}

/// Provider of the engine's entry points.
///
/// Library discovery is not part of this crate; whoever constructs a
/// provider decides where the symbols come from.
///
/// # Safety
///
/// [`Document`](crate::Document) reads provider results from safe code, so
/// implementors must uphold the engine contract:
///
/// - `open`/`open_memory` return null or a handle that stays valid until
///   it is passed to `close`;
/// - a non-null pointer from `extract_page`, `extract_all` or
///   `extract_all_parallel` addresses the number of readable bytes written
///   to `out_len`, and stays valid until `free_buffer`;
/// - a non-null pointer from `extract_bounds` addresses the number of
///   initialized spans written to `out_count`, each span's `text` is null
///   or addresses `text_len` readable bytes, and all of it stays valid
///   until `free_bounds`;
/// - `get_page_info` only writes through its output pointers.
///
/// Implementing the trait therefore requires `unsafe impl`:
///
/// ```compile_fail
/// use std::os::raw::{c_char, c_int};
/// use zpdf::sys::{NativeApi, RawDocument, RawTextSpan};
///
/// struct Unchecked;
///
/// impl NativeApi for Unchecked {
///     unsafe fn open(&self, _: *const c_char) -> *mut RawDocument { std::ptr::null_mut() }
///     unsafe fn open_memory(&self, _: *const u8, _: usize) -> *mut RawDocument { std::ptr::null_mut() }
///     unsafe fn close(&self, _: *mut RawDocument) {}
///     unsafe fn page_count(&self, _: *mut RawDocument) -> c_int { 0 }
///     unsafe fn get_page_info(&self, _: *mut RawDocument, _: c_int, _: *mut f64, _: *mut f64, _: *mut c_int) -> c_int { -1 }
///     unsafe fn extract_page(&self, _: *mut RawDocument, _: c_int, _: *mut usize) -> *mut u8 { std::ptr::null_mut() }
///     unsafe fn extract_all(&self, _: *mut RawDocument, _: *mut usize) -> *mut u8 { std::ptr::null_mut() }
///     unsafe fn extract_all_parallel(&self, _: *mut RawDocument, _: *mut usize) -> *mut u8 { std::ptr::null_mut() }
///     unsafe fn extract_bounds(&self, _: *mut RawDocument, _: c_int, _: *mut usize) -> *mut RawTextSpan { std::ptr::null_mut() }
///     unsafe fn free_buffer(&self, _: *mut u8, _: usize) {}
///     unsafe fn free_bounds(&self, _: *mut RawTextSpan, _: usize) {}
/// }
/// ```
pub unsafe trait NativeApi {
    /// Open a document from a NUL-terminated path. Null on failure.
    unsafe fn open(&self, path: *const c_char) -> *mut RawDocument;

    /// Open a document from `len` bytes at `data`. Null on failure.
    unsafe fn open_memory(&self, data: *const u8, len: usize) -> *mut RawDocument;

    /// Release a document. Must be called at most once per handle.
    unsafe fn close(&self, doc: *mut RawDocument);

    /// Number of pages, negative on error.
    unsafe fn page_count(&self, doc: *mut RawDocument) -> c_int;

    /// Write page geometry through the output pointers. Zero on success.
    unsafe fn get_page_info(
        &self,
        doc: *mut RawDocument,
        page: c_int,
        width: *mut f64,
        height: *mut f64,
        rotation: *mut c_int,
    ) -> c_int;

    /// Text of one page. Release with [`free_buffer`](Self::free_buffer).
    unsafe fn extract_page(
        &self,
        doc: *mut RawDocument,
        page: c_int,
        out_len: *mut usize,
    ) -> *mut u8;

    /// Text of the whole document, extracted page after page.
    unsafe fn extract_all(&self, doc: *mut RawDocument, out_len: *mut usize) -> *mut u8;

    /// Text of the whole document, with pages extracted concurrently by the engine.
    unsafe fn extract_all_parallel(&self, doc: *mut RawDocument, out_len: *mut usize)
        -> *mut u8;

    /// Positioned spans of one page. Release with [`free_bounds`](Self::free_bounds).
    unsafe fn extract_bounds(
        &self,
        doc: *mut RawDocument,
        page: c_int,
        out_count: *mut usize,
    ) -> *mut RawTextSpan;

    unsafe fn free_buffer(&self, ptr: *mut u8, len: usize);

    unsafe fn free_bounds(&self, ptr: *mut RawTextSpan, count: usize);
}

macro_rules! forward_native_api {
    ($($wrapper:ty),* $(,)?) => {$(
        // SAFETY: forwards to `T`, which upholds the contract.
        unsafe impl<T: NativeApi + ?Sized> NativeApi for $wrapper {
            unsafe fn open(&self, path: *const c_char) -> *mut RawDocument {
                (**self).open(path)
            }

            unsafe fn open_memory(&self, data: *const u8, len: usize) -> *mut RawDocument {
                (**self).open_memory(data, len)
            }

            unsafe fn close(&self, doc: *mut RawDocument) {
                (**self).close(doc)
            }

            unsafe fn page_count(&self, doc: *mut RawDocument) -> c_int {
                (**self).page_count(doc)
            }

            unsafe fn get_page_info(
                &self,
                doc: *mut RawDocument,
                page: c_int,
                width: *mut f64,
                height: *mut f64,
                rotation: *mut c_int,
            ) -> c_int {
                (**self).get_page_info(doc, page, width, height, rotation)
            }

            unsafe fn extract_page(
                &self,
                doc: *mut RawDocument,
                page: c_int,
                out_len: *mut usize,
            ) -> *mut u8 {
                (**self).extract_page(doc, page, out_len)
            }

            unsafe fn extract_all(&self, doc: *mut RawDocument, out_len: *mut usize) -> *mut u8 {
                (**self).extract_all(doc, out_len)
            }

            unsafe fn extract_all_parallel(
                &self,
                doc: *mut RawDocument,
                out_len: *mut usize,
            ) -> *mut u8 {
                (**self).extract_all_parallel(doc, out_len)
            }

            unsafe fn extract_bounds(
                &self,
                doc: *mut RawDocument,
                page: c_int,
                out_count: *mut usize,
            ) -> *mut RawTextSpan {
                (**self).extract_bounds(doc, page, out_count)
            }

            unsafe fn free_buffer(&self, ptr: *mut u8, len: usize) {
                (**self).free_buffer(ptr, len)
            }

            unsafe fn free_bounds(&self, ptr: *mut RawTextSpan, count: usize) {
                (**self).free_bounds(ptr, count)
            }
        }
    )*};
}

forward_native_api!(&T, Box<T>, Arc<T>);

#[cfg(feature = "native")]
pub use linked::LinkedApi;

#[cfg(feature = "native")]
mod linked {
    use super::{NativeApi, RawDocument, RawTextSpan};
    use std::os::raw::{c_char, c_int};

    #[link(name = "zpdf")]
    extern "C" {
        fn zpdf_open(path: *const c_char) -> *mut RawDocument;
        fn zpdf_open_memory(data: *const u8, len: usize) -> *mut RawDocument;
        fn zpdf_close(doc: *mut RawDocument);
        fn zpdf_page_count(doc: *mut RawDocument) -> c_int;
        fn zpdf_get_page_info(
            doc: *mut RawDocument,
            page_num: c_int,
            width: *mut f64,
            height: *mut f64,
            rotation: *mut c_int,
        ) -> c_int;
        fn zpdf_extract_page(doc: *mut RawDocument, page_num: c_int, out_len: *mut usize)
            -> *mut u8;
        fn zpdf_extract_all(doc: *mut RawDocument, out_len: *mut usize) -> *mut u8;
        fn zpdf_extract_all_parallel(doc: *mut RawDocument, out_len: *mut usize) -> *mut u8;
        fn zpdf_extract_bounds(
            doc: *mut RawDocument,
            page_num: c_int,
            out_count: *mut usize,
        ) -> *mut RawTextSpan;
        fn zpdf_free_buffer(ptr: *mut u8, len: usize);
        fn zpdf_free_bounds(ptr: *mut RawTextSpan, count: usize);
    }

    /// Entry points of the `libzpdf` shared library, resolved at link time.
    ///
    /// Set `ZPDF_LIB_DIR` at build time if the library is not on the
    /// default linker search path.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LinkedApi;

    // SAFETY: libzpdf implements the documented engine contract.
    unsafe impl NativeApi for LinkedApi {
        unsafe fn open(&self, path: *const c_char) -> *mut RawDocument {
            zpdf_open(path)
        }

        unsafe fn open_memory(&self, data: *const u8, len: usize) -> *mut RawDocument {
            zpdf_open_memory(data, len)
        }

        unsafe fn close(&self, doc: *mut RawDocument) {
            zpdf_close(doc)
        }

        unsafe fn page_count(&self, doc: *mut RawDocument) -> c_int {
            zpdf_page_count(doc)
        }

        unsafe fn get_page_info(
            &self,
            doc: *mut RawDocument,
            page: c_int,
            width: *mut f64,
            height: *mut f64,
            rotation: *mut c_int,
        ) -> c_int {
            zpdf_get_page_info(doc, page, width, height, rotation)
        }

        unsafe fn extract_page(
            &self,
            doc: *mut RawDocument,
            page: c_int,
            out_len: *mut usize,
        ) -> *mut u8 {
            zpdf_extract_page(doc, page, out_len)
        }

        unsafe fn extract_all(&self, doc: *mut RawDocument, out_len: *mut usize) -> *mut u8 {
            zpdf_extract_all(doc, out_len)
        }

        unsafe fn extract_all_parallel(
            &self,
            doc: *mut RawDocument,
            out_len: *mut usize,
        ) -> *mut u8 {
            zpdf_extract_all_parallel(doc, out_len)
        }

        unsafe fn extract_bounds(
            &self,
            doc: *mut RawDocument,
            page: c_int,
            out_count: *mut usize,
        ) -> *mut RawTextSpan {
            zpdf_extract_bounds(doc, page, out_count)
        }

        unsafe fn free_buffer(&self, ptr: *mut u8, len: usize) {
            zpdf_free_buffer(ptr, len)
        }

        unsafe fn free_bounds(&self, ptr: *mut RawTextSpan, count: usize) {
            zpdf_free_bounds(ptr, count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn test_raw_text_span_layout() {
        // Four coordinates, pointer, length, font size: no padding on 64-bit.
        if size_of::<usize>() == 8 {
            assert_eq!(size_of::<RawTextSpan>(), 7 * 8);
        }
        assert_eq!(align_of::<RawTextSpan>(), align_of::<f64>().max(align_of::<usize>()));
    }

    #[test]
    fn test_raw_document_is_zero_sized() {
        assert_eq!(size_of::<RawDocument>(), 0);
    }
}
