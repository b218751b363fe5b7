//! In-process stand-in for the native engine.
//!
//! [`MockApi`] implements [`NativeApi`] without `libzpdf`, so the binding
//! can be exercised anywhere. It records every call, keeps a ledger of
//! live handles and allocations, and counts releases of memory it does not
//! own, which makes leaks and double releases observable from tests.
//!
//! # Document format
//!
//! The mock engine does not parse PDF. It opens a tiny text container:
//!
//! - the data starts with `%MOCK`, and the rest of that first line is ignored;
//! - the remaining text is split into pages on form feed (`\x0c`);
//! - every non-blank line of a page becomes one span.
//!
//! Anything else, including invalid UTF-8, is rejected like an unparsable
//! PDF. [`MockApi::build_document`] produces valid input.

use std::collections::{HashMap, HashSet};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rayon::prelude::*;

use crate::sys::{NativeApi, RawDocument, RawTextSpan};

/// Magic bytes the mock engine expects at the start of a document.
pub const MOCK_MAGIC: &[u8] = b"%MOCK";

/// Page width reported for every mock page, in points.
pub const MOCK_PAGE_WIDTH: f64 = 612.0;

/// Page height reported for every mock page, in points.
pub const MOCK_PAGE_HEIGHT: f64 = 792.0;

const LEFT_MARGIN: f64 = 72.0;
const TOP_MARGIN: f64 = 72.0;
const FONT_SIZE: f64 = 12.0;
const LINE_HEIGHT: f64 = 14.0;
const GLYPH_WIDTH: f64 = 6.0;

/// One recorded boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCall {
    Open,
    OpenMemory,
    Close,
    PageCount,
    PageInfo(i32),
    ExtractPage(i32),
    ExtractAll,
    ExtractAllParallel,
    ExtractBounds(i32),
    FreeBuffer,
    FreeBounds,
}

/// Failure sentinels the mock engine can be told to return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockFaults {
    /// `page_count` returns -1.
    pub page_count: bool,
    /// `get_page_info` returns a nonzero status.
    pub page_info: bool,
    /// `extract_page`, `extract_all` and `extract_all_parallel` return null.
    pub extract: bool,
    /// `extract_bounds` returns null and writes this count.
    pub bounds_count: Option<usize>,
    /// Spans carry a null text pointer with a nonzero length.
    pub null_span_text: bool,
    /// Every text buffer gets an invalid UTF-8 byte appended.
    pub invalid_utf8: bool,
}

#[derive(Debug)]
struct MockDocument {
    pages: Vec<String>,
}

impl MockDocument {
    fn parse(data: &[u8]) -> Option<Self> {
        let rest = data.strip_prefix(MOCK_MAGIC)?;
        let text = std::str::from_utf8(rest).ok()?;
        let body = match text.find('\n') {
            Some(pos) => &text[pos + 1..],
            None => "",
        };
        let pages = if body.is_empty() {
            Vec::new()
        } else {
            body.split('\x0c').map(str::to_string).collect()
        };
        Some(Self { pages })
    }

    fn page(&self, index: c_int) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.pages.get(i))
            .map(String::as_str)
    }
}

/// Raw parts of an owned `Vec`, recorded so it can be rebuilt on release.
#[derive(Debug, Clone, Copy)]
struct RawVec {
    len: usize,
    capacity: usize,
}

#[derive(Debug)]
struct SpanArray {
    vec: RawVec,
    texts: Vec<(usize, RawVec)>,
}

#[derive(Debug, Default)]
struct Ledger {
    handles: HashSet<usize>,
    buffers: HashMap<usize, RawVec>,
    span_arrays: HashMap<usize, SpanArray>,
    invalid_releases: usize,
    stale_handle_uses: usize,
}

/// Instrumented implementation of [`NativeApi`].
///
/// Share it with a document through `&MockApi` or `Arc<MockApi>` to keep
/// inspecting it while the document is alive.
///
/// The call log grows with every crossing. Long-running loops such as
/// benchmarks should turn it off with [`set_recording`](Self::set_recording);
/// the ledger keeps tracking handles and allocations either way.
#[derive(Debug, Default)]
pub struct MockApi {
    calls: Mutex<Vec<NativeCall>>,
    /// Call log disabled.
    unrecorded: AtomicBool,
    faults: Mutex<MockFaults>,
    ledger: Mutex<Ledger>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockApi {
    /// Create a mock engine with no faults injected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock engine that returns the given failure sentinels.
    pub fn with_faults(faults: MockFaults) -> Self {
        let api = Self::new();
        api.set_faults(faults);
        api
    }

    /// Replace the injected faults.
    pub fn set_faults(&self, faults: MockFaults) {
        *lock(&self.faults) = faults;
    }

    /// Create a mock engine that does not log calls.
    pub fn unrecorded() -> Self {
        let api = Self::new();
        api.set_recording(false);
        api
    }

    /// Turn the call log on or off. Already recorded calls are kept.
    pub fn set_recording(&self, on: bool) {
        self.unrecorded.store(!on, Ordering::Relaxed);
    }

    pub fn is_recording(&self) -> bool {
        !self.unrecorded.load(Ordering::Relaxed)
    }

    /// Build document bytes the mock engine accepts, one entry per page.
    pub fn build_document(pages: &[&str]) -> Vec<u8> {
        let mut data = MOCK_MAGIC.to_vec();
        data.push(b'\n');
        data.extend_from_slice(pages.join("\x0c").as_bytes());
        data
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<NativeCall> {
        lock(&self.calls).clone()
    }

    /// Total number of calls made so far.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of calls equal to `call`.
    pub fn count(&self, call: NativeCall) -> usize {
        lock(&self.calls).iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Documents opened and not yet closed.
    pub fn live_handles(&self) -> usize {
        lock(&self.ledger).handles.len()
    }

    /// Buffers and span arrays handed out and not yet released.
    pub fn live_allocations(&self) -> usize {
        let ledger = lock(&self.ledger);
        ledger.buffers.len() + ledger.span_arrays.len()
    }

    /// Releases of handles or memory the engine did not own at the time:
    /// double releases, foreign pointers, or mismatched lengths.
    pub fn invalid_releases(&self) -> usize {
        lock(&self.ledger).invalid_releases
    }

    /// Calls that passed a handle which was already closed.
    pub fn stale_handle_uses(&self) -> usize {
        lock(&self.ledger).stale_handle_uses
    }

    fn record(&self, call: NativeCall) {
        if self.is_recording() {
            lock(&self.calls).push(call);
        }
    }

    fn faults(&self) -> MockFaults {
        lock(&self.faults).clone()
    }

    fn adopt(&self, doc: MockDocument) -> *mut RawDocument {
        let raw = Box::into_raw(Box::new(doc));
        lock(&self.ledger).handles.insert(raw as usize);
        raw.cast()
    }

    /// Resolve a handle, counting the use if it is not live.
    ///
    /// # Safety
    ///
    /// Live handles in the ledger point at boxed documents owned by `self`.
    unsafe fn document(&self, doc: *mut RawDocument) -> Option<&MockDocument> {
        if lock(&self.ledger).handles.contains(&(doc as usize)) {
            Some(&*(doc as *const MockDocument))
        } else {
            lock(&self.ledger).stale_handle_uses += 1;
            None
        }
    }

    fn page_bytes(&self, text: &str, faults: &MockFaults) -> Vec<u8> {
        let mut bytes = text.as_bytes().to_vec();
        if faults.invalid_utf8 {
            bytes.push(0xFF);
        }
        bytes
    }

    /// Hand out a buffer and write its length.
    ///
    /// # Safety
    ///
    /// `out_len` must be writable.
    unsafe fn hand_out(&self, bytes: Vec<u8>, out_len: *mut usize) -> *mut u8 {
        // Capacity of at least one byte gives every buffer a distinct address.
        let mut vec = Vec::with_capacity(bytes.len().max(1));
        vec.extend_from_slice(&bytes);
        let raw = RawVec {
            len: vec.len(),
            capacity: vec.capacity(),
        };
        let ptr = vec.as_mut_ptr();
        std::mem::forget(vec);

        lock(&self.ledger).buffers.insert(ptr as usize, raw);
        *out_len = raw.len;
        ptr
    }

    unsafe fn extract_whole(
        &self,
        doc: *mut RawDocument,
        out_len: *mut usize,
        parallel: bool,
    ) -> *mut u8 {
        let faults = self.faults();
        let Some(document) = self.document(doc) else {
            return ptr::null_mut();
        };
        if faults.extract {
            return ptr::null_mut();
        }

        let pages: Vec<Vec<u8>> = if parallel {
            document
                .pages
                .par_iter()
                .map(|page| self.page_bytes(page, &faults))
                .collect()
        } else {
            document
                .pages
                .iter()
                .map(|page| self.page_bytes(page, &faults))
                .collect()
        };
        self.hand_out(pages.concat(), out_len)
    }
}

/// Interpret a C path as a filesystem path.
fn c_path(path: &CStr) -> Option<std::path::PathBuf> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Some(std::ffi::OsStr::from_bytes(path.to_bytes()).into())
    }
    #[cfg(not(unix))]
    {
        path.to_str().ok().map(Into::into)
    }
}

// SAFETY: every pointer handed out is a live allocation recorded in the
// ledger with the length written to the caller.
unsafe impl NativeApi for MockApi {
    unsafe fn open(&self, path: *const c_char) -> *mut RawDocument {
        self.record(NativeCall::Open);
        if path.is_null() {
            return ptr::null_mut();
        }
        let parsed = c_path(CStr::from_ptr(path))
            .and_then(|path| std::fs::read(path).ok())
            .and_then(|data| MockDocument::parse(&data));
        match parsed {
            Some(doc) => self.adopt(doc),
            None => ptr::null_mut(),
        }
    }

    unsafe fn open_memory(&self, data: *const u8, len: usize) -> *mut RawDocument {
        self.record(NativeCall::OpenMemory);
        if data.is_null() {
            return ptr::null_mut();
        }
        match MockDocument::parse(slice::from_raw_parts(data, len)) {
            Some(doc) => self.adopt(doc),
            None => ptr::null_mut(),
        }
    }

    unsafe fn close(&self, doc: *mut RawDocument) {
        self.record(NativeCall::Close);
        let removed = lock(&self.ledger).handles.remove(&(doc as usize));
        if removed {
            drop(Box::from_raw(doc as *mut MockDocument));
        } else {
            lock(&self.ledger).invalid_releases += 1;
        }
    }

    unsafe fn page_count(&self, doc: *mut RawDocument) -> c_int {
        self.record(NativeCall::PageCount);
        let faults = self.faults();
        match self.document(doc) {
            Some(_) if faults.page_count => -1,
            Some(document) => c_int::try_from(document.pages.len()).unwrap_or(-1),
            None => -1,
        }
    }

    unsafe fn get_page_info(
        &self,
        doc: *mut RawDocument,
        page: c_int,
        width: *mut f64,
        height: *mut f64,
        rotation: *mut c_int,
    ) -> c_int {
        self.record(NativeCall::PageInfo(page));
        let faults = self.faults();
        match self.document(doc).and_then(|d| d.page(page)) {
            Some(_) if !faults.page_info => {
                *width = MOCK_PAGE_WIDTH;
                *height = MOCK_PAGE_HEIGHT;
                *rotation = 0;
                0
            }
            _ => -1,
        }
    }

    unsafe fn extract_page(
        &self,
        doc: *mut RawDocument,
        page: c_int,
        out_len: *mut usize,
    ) -> *mut u8 {
        self.record(NativeCall::ExtractPage(page));
        let faults = self.faults();
        match self.document(doc).and_then(|d| d.page(page)) {
            Some(text) if !faults.extract => {
                let bytes = self.page_bytes(text, &faults);
                self.hand_out(bytes, out_len)
            }
            _ => ptr::null_mut(),
        }
    }

    unsafe fn extract_all(&self, doc: *mut RawDocument, out_len: *mut usize) -> *mut u8 {
        self.record(NativeCall::ExtractAll);
        self.extract_whole(doc, out_len, false)
    }

    unsafe fn extract_all_parallel(&self, doc: *mut RawDocument, out_len: *mut usize) -> *mut u8 {
        self.record(NativeCall::ExtractAllParallel);
        self.extract_whole(doc, out_len, true)
    }

    unsafe fn extract_bounds(
        &self,
        doc: *mut RawDocument,
        page: c_int,
        out_count: *mut usize,
    ) -> *mut RawTextSpan {
        self.record(NativeCall::ExtractBounds(page));
        let faults = self.faults();
        if let Some(count) = faults.bounds_count {
            *out_count = count;
            return ptr::null_mut();
        }
        let Some(text) = self.document(doc).and_then(|d| d.page(page)) else {
            return ptr::null_mut();
        };

        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            *out_count = 0;
            return ptr::null_mut();
        }

        let mut texts = Vec::with_capacity(lines.len());
        let mut spans = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            let y0 = TOP_MARGIN + i as f64 * LINE_HEIGHT;
            let glyphs = line.chars().count() as f64;
            let (text_ptr, text_len) = if faults.null_span_text {
                (ptr::null(), line.len())
            } else {
                let mut bytes = line.as_bytes().to_vec();
                bytes.shrink_to_fit();
                let raw = RawVec {
                    len: bytes.len(),
                    capacity: bytes.capacity(),
                };
                let text_ptr = bytes.as_mut_ptr();
                std::mem::forget(bytes);
                texts.push((text_ptr as usize, raw));
                (text_ptr as *const u8, raw.len)
            };
            spans.push(RawTextSpan {
                x0: LEFT_MARGIN,
                y0,
                x1: LEFT_MARGIN + glyphs * GLYPH_WIDTH,
                y1: y0 + FONT_SIZE,
                text: text_ptr,
                text_len,
                font_size: FONT_SIZE,
            });
        }

        let vec = RawVec {
            len: spans.len(),
            capacity: spans.capacity(),
        };
        let ptr = spans.as_mut_ptr();
        std::mem::forget(spans);
        lock(&self.ledger)
            .span_arrays
            .insert(ptr as usize, SpanArray { vec, texts });
        *out_count = vec.len;
        ptr
    }

    unsafe fn free_buffer(&self, ptr: *mut u8, len: usize) {
        self.record(NativeCall::FreeBuffer);
        let mut ledger = lock(&self.ledger);
        match ledger.buffers.remove(&(ptr as usize)) {
            Some(raw) if raw.len == len => {
                drop(Vec::from_raw_parts(ptr, raw.len, raw.capacity));
            }
            Some(raw) => {
                // Wrong length: keep the allocation tracked and flag the call.
                ledger.buffers.insert(ptr as usize, raw);
                ledger.invalid_releases += 1;
            }
            None => ledger.invalid_releases += 1,
        }
    }

    unsafe fn free_bounds(&self, ptr: *mut RawTextSpan, count: usize) {
        self.record(NativeCall::FreeBounds);
        let mut ledger = lock(&self.ledger);
        match ledger.span_arrays.remove(&(ptr as usize)) {
            Some(array) if array.vec.len == count => {
                for (text_ptr, raw) in array.texts {
                    drop(Vec::from_raw_parts(text_ptr as *mut u8, raw.len, raw.capacity));
                }
                drop(Vec::from_raw_parts(ptr, array.vec.len, array.vec.capacity));
            }
            Some(array) => {
                ledger.span_arrays.insert(ptr as usize, array);
                ledger.invalid_releases += 1;
            }
            None => ledger.invalid_releases += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(api: &MockApi, pages: &[&str]) -> *mut RawDocument {
        let data = MockApi::build_document(pages);
        unsafe { api.open_memory(data.as_ptr(), data.len()) }
    }

    #[test]
    fn test_parse_document() {
        let doc = MockDocument::parse(&MockApi::build_document(&["a", "b\nc"])).unwrap();
        assert_eq!(doc.pages, vec!["a".to_string(), "b\nc".to_string()]);

        let empty = MockDocument::parse(b"%MOCK\n").unwrap();
        assert!(empty.pages.is_empty());

        assert!(MockDocument::parse(b"%PDF-1.7\n").is_none());
        assert!(MockDocument::parse(b"%MOCK\n\xFF").is_none());
    }

    #[test]
    fn test_open_and_close_track_handles() {
        let api = MockApi::new();
        let doc = open(&api, &["one"]);
        assert!(!doc.is_null());
        assert_eq!(api.live_handles(), 1);

        unsafe { api.close(doc) };
        assert_eq!(api.live_handles(), 0);
        assert_eq!(api.invalid_releases(), 0);

        unsafe { api.close(doc) };
        assert_eq!(api.invalid_releases(), 1);
    }

    #[test]
    fn test_open_rejects_garbage() {
        let api = MockApi::new();
        let data = b"not a pdf";
        let doc = unsafe { api.open_memory(data.as_ptr(), data.len()) };
        assert!(doc.is_null());
        assert_eq!(api.live_handles(), 0);
    }

    #[test]
    fn test_buffers_are_distinct_and_released() {
        let api = MockApi::new();
        let doc = open(&api, &["", ""]);

        let (mut a_len, mut b_len) = (0usize, 0usize);
        let a = unsafe { api.extract_page(doc, 0, &mut a_len) };
        let b = unsafe { api.extract_page(doc, 1, &mut b_len) };
        assert_ne!(a, b);
        assert_eq!((a_len, b_len), (0, 0));
        assert_eq!(api.live_allocations(), 2);

        unsafe {
            api.free_buffer(a, a_len);
            api.free_buffer(b, b_len);
            api.free_buffer(b, b_len);
        }
        assert_eq!(api.live_allocations(), 0);
        assert_eq!(api.invalid_releases(), 1);

        unsafe { api.close(doc) };
    }

    #[test]
    fn test_wrong_length_release_is_flagged() {
        let api = MockApi::new();
        let doc = open(&api, &["abc"]);
        let mut len = 0usize;
        let buf = unsafe { api.extract_page(doc, 0, &mut len) };
        assert_eq!(len, 3);

        unsafe { api.free_buffer(buf, 2) };
        assert_eq!(api.invalid_releases(), 1);
        assert_eq!(api.live_allocations(), 1);

        unsafe {
            api.free_buffer(buf, len);
            api.close(doc);
        }
        assert_eq!(api.live_allocations(), 0);
    }

    #[test]
    fn test_bounds_layout() {
        let api = MockApi::new();
        let doc = open(&api, &["first line\n\nsecond"]);
        let mut count = 0usize;
        let spans = unsafe { api.extract_bounds(doc, 0, &mut count) };
        assert!(!spans.is_null());
        assert_eq!(count, 2);

        let slice = unsafe { slice::from_raw_parts(spans, count) };
        assert_eq!(slice[0].x0, LEFT_MARGIN);
        assert_eq!(slice[0].x1, LEFT_MARGIN + 10.0 * GLYPH_WIDTH);
        assert_eq!(slice[1].y0, TOP_MARGIN + LINE_HEIGHT);

        unsafe {
            api.free_bounds(spans, count);
            api.close(doc);
        }
        assert_eq!(api.live_allocations(), 0);
        assert_eq!(api.invalid_releases(), 0);
    }

    #[test]
    fn test_blank_page_bounds_is_null_with_zero_count() {
        let api = MockApi::new();
        let doc = open(&api, &["   \n"]);
        let mut count = 99usize;
        let spans = unsafe { api.extract_bounds(doc, 0, &mut count) };
        assert!(spans.is_null());
        assert_eq!(count, 0);
        unsafe { api.close(doc) };
    }

    #[test]
    fn test_unrecorded_engine_still_keeps_ledger() {
        let api = MockApi::unrecorded();
        assert!(!api.is_recording());

        for _ in 0..100 {
            let doc = open(&api, &["abc"]);
            let mut len = 0usize;
            let buf = unsafe { api.extract_page(doc, 0, &mut len) };
            assert_eq!(api.live_allocations(), 1);
            unsafe {
                api.free_buffer(buf, len);
                api.close(doc);
            }
        }
        assert_eq!(api.call_count(), 0);
        assert_eq!(api.live_handles(), 0);
        assert_eq!(api.live_allocations(), 0);
        assert_eq!(api.invalid_releases(), 0);

        api.set_recording(true);
        let doc = open(&api, &["x"]);
        unsafe { api.close(doc) };
        assert_eq!(api.calls(), vec![NativeCall::OpenMemory, NativeCall::Close]);
    }

    #[test]
    fn test_stale_handle_is_counted() {
        let api = MockApi::new();
        let doc = open(&api, &["x"]);
        unsafe {
            api.close(doc);
            assert_eq!(api.page_count(doc), -1);
        }
        assert_eq!(api.stale_handle_uses(), 1);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let api = MockApi::new();
        let pages: Vec<String> = (0..32).map(|i| format!("page {}\n", i)).collect();
        let refs: Vec<&str> = pages.iter().map(String::as_str).collect();
        let doc = open(&api, &refs);

        let (mut seq_len, mut par_len) = (0usize, 0usize);
        unsafe {
            let seq = api.extract_all(doc, &mut seq_len);
            let par = api.extract_all_parallel(doc, &mut par_len);
            assert_eq!(
                slice::from_raw_parts(seq, seq_len),
                slice::from_raw_parts(par, par_len)
            );
            api.free_buffer(seq, seq_len);
            api.free_buffer(par, par_len);
            api.close(doc);
        }
        assert_eq!(api.live_allocations(), 0);
    }
}
