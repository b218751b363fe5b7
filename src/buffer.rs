//! Scoped ownership of engine-allocated memory.
//!
//! Each owner releases its allocation in `Drop` through the matching
//! release entry point, so the release also happens when decoding fails
//! or a panic unwinds through the caller.

use std::ptr::NonNull;
use std::slice;

use crate::error::{Error, Result};
use crate::model::TextSpan;
use crate::sys::{NativeApi, RawTextSpan};

/// Decode bytes as UTF-8, replacing invalid sequences with U+FFFD.
pub(crate) fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// A byte buffer returned by an extraction call, released with `free_buffer`.
pub(crate) struct NativeBuffer<'a, A: NativeApi + ?Sized> {
    api: &'a A,
    ptr: NonNull<u8>,
    len: usize,
}

impl<'a, A: NativeApi + ?Sized> NativeBuffer<'a, A> {
    /// Take ownership of `len` bytes at `ptr`. Returns `None` for a null
    /// pointer, in which case nothing is owned and nothing will be released.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must come from an extraction call of `api`, address
    /// `len` readable bytes, and not have been released yet.
    pub(crate) unsafe fn from_raw(api: &'a A, ptr: *mut u8, len: usize) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { api, ptr, len })
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        // SAFETY: guaranteed by the `from_raw` contract until drop.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Copy the contents out as an owned string.
    pub(crate) fn to_string_lossy(&self) -> String {
        decode_lossy(self.as_bytes())
    }
}

impl<A: NativeApi + ?Sized> Drop for NativeBuffer<'_, A> {
    fn drop(&mut self) {
        log::trace!("Releasing native buffer of {} bytes", self.len);
        // SAFETY: the buffer is owned and released exactly once, here.
        unsafe { self.api.free_buffer(self.ptr.as_ptr(), self.len) }
    }
}

/// A span array returned by `extract_bounds`, released with `free_bounds`.
pub(crate) struct NativeSpans<'a, A: NativeApi + ?Sized> {
    api: &'a A,
    ptr: NonNull<RawTextSpan>,
    count: usize,
}

impl<'a, A: NativeApi + ?Sized> NativeSpans<'a, A> {
    /// Take ownership of `count` spans at `ptr`. Returns `None` for a null
    /// pointer.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must come from `extract_bounds` of `api`, address
    /// `count` initialized elements, and not have been released yet.
    pub(crate) unsafe fn from_raw(api: &'a A, ptr: *mut RawTextSpan, count: usize) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { api, ptr, count })
    }

    pub(crate) fn as_slice(&self) -> &[RawTextSpan] {
        // SAFETY: guaranteed by the `from_raw` contract until drop.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.count) }
    }

    /// Copy every span, text included, into owned values.
    ///
    /// A span whose text pointer is null while its length is not zero is
    /// malformed and fails the whole conversion.
    pub(crate) fn to_text_spans(&self) -> Result<Vec<TextSpan>> {
        self.as_slice()
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let text = if raw.text_len == 0 {
                    String::new()
                } else if raw.text.is_null() {
                    return Err(Error::ExtractionFailure(format!(
                        "Span {} has a null text pointer with length {}",
                        i, raw.text_len
                    )));
                } else {
                    // SAFETY: span text lives as long as the span array.
                    decode_lossy(unsafe { slice::from_raw_parts(raw.text, raw.text_len) })
                };
                Ok(TextSpan {
                    x0: raw.x0,
                    y0: raw.y0,
                    x1: raw.x1,
                    y1: raw.y1,
                    text,
                    font_size: raw.font_size,
                })
            })
            .collect()
    }
}

impl<A: NativeApi + ?Sized> Drop for NativeSpans<'_, A> {
    fn drop(&mut self) {
        log::trace!("Releasing native span array of {} spans", self.count);
        // SAFETY: the array is owned and released exactly once, here.
        unsafe { self.api.free_bounds(self.ptr.as_ptr(), self.count) }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::mock::{MockApi, NativeCall};
    use std::ptr;

    #[test]
    fn test_decode_lossy_replaces_invalid_bytes() {
        assert_eq!(decode_lossy(b"Hello"), "Hello");
        assert_eq!(decode_lossy(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
        assert_eq!(decode_lossy(&[]), "");
    }

    #[test]
    fn test_null_buffer_owns_nothing() {
        let api = MockApi::new();
        let buffer = unsafe { NativeBuffer::from_raw(&api, ptr::null_mut(), 0) };
        assert!(buffer.is_none());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_null_spans_own_nothing() {
        let api = MockApi::new();
        let spans = unsafe { NativeSpans::from_raw(&api, ptr::null_mut(), 3) };
        assert!(spans.is_none());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_buffer_released_on_panic() {
        let api = MockApi::new();
        let data = MockApi::build_document(&["page one"]);
        let doc = unsafe { api.open_memory(data.as_ptr(), data.len()) };
        assert!(!doc.is_null());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut len = 0usize;
            let raw = unsafe { api.extract_page(doc, 0, &mut len) };
            let buffer = unsafe { NativeBuffer::from_raw(&api, raw, len) }.unwrap();
            assert_eq!(buffer.to_string_lossy(), "page one");
            panic!("processing failed after the copy");
        }));
        assert!(result.is_err());
        assert_eq!(api.count(NativeCall::FreeBuffer), 1);
        assert_eq!(api.live_allocations(), 0);

        unsafe { api.close(doc) };
        assert_eq!(api.live_handles(), 0);
        assert_eq!(api.invalid_releases(), 0);
    }
}
