//! Integration tests for document lifecycle and error translation.

use std::sync::Arc;

use zpdf::mock::{MockApi, MockFaults, NativeCall};
use zpdf::{Document, Error, ErrorKind, ExtractMode};

fn three_pages() -> Vec<u8> {
    MockApi::build_document(&["Page one\n", "Page two\n", "Page three\n"])
}

#[test]
fn test_three_page_scenario() {
    let api = Arc::new(MockApi::new());
    let mut doc = Document::from_bytes_with(Arc::clone(&api), &three_pages()).unwrap();

    assert_eq!(doc.page_count().unwrap(), 3);

    let err = doc.extract_page(5).unwrap_err();
    assert!(matches!(err, Error::PageNotFound { page: 5 }));

    doc.close();
    let err = doc.page_count().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UseAfterClose);
}

#[test]
fn test_unparsable_bytes_scenario() {
    let api = Arc::new(MockApi::new());
    let result = Document::from_bytes_with(Arc::clone(&api), b"%PDF-1.4\nthis is not a document");

    match result {
        Err(Error::InvalidDocument(message)) => assert!(message.contains("Failed to open PDF")),
        other => panic!("expected InvalidDocument, got {:?}", other),
    }
    assert_eq!(api.live_handles(), 0);
    assert_eq!(api.count(NativeCall::Close), 0);
}

#[test]
fn test_missing_file_is_invalid_document() {
    let api = MockApi::new();
    let err = Document::open_with(&api, "/definitely/not/here.pdf").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDocument);
    assert!(err.to_string().contains("/definitely/not/here.pdf"));
}

#[test]
fn test_page_count_is_stable() {
    let api = MockApi::new();
    let doc = Document::from_bytes_with(&api, &three_pages()).unwrap();
    let counts: Vec<usize> = (0..5).map(|_| doc.page_count().unwrap()).collect();
    assert!(counts.iter().all(|&c| c == 3));
    assert_eq!(doc.len().unwrap(), 3);
    assert!(!doc.is_empty().unwrap());
}

#[test]
fn test_empty_document() {
    let api = MockApi::new();
    let doc = Document::from_bytes_with(&api, &MockApi::build_document(&[])).unwrap();
    assert_eq!(doc.page_count().unwrap(), 0);
    assert!(doc.is_empty().unwrap());
    assert!(doc.pages().next().is_none());
    assert!(matches!(doc.extract_page(0), Err(Error::PageNotFound { page: 0 })));
    assert_eq!(doc.extract_all(ExtractMode::Parallel).unwrap(), "");
}

#[test]
fn test_manual_close_then_drop_releases_once() {
    let api = Arc::new(MockApi::new());
    {
        let mut doc = Document::from_bytes_with(Arc::clone(&api), &three_pages()).unwrap();
        doc.close();
        assert!(doc.is_closed());
        doc.close();
    }
    assert_eq!(api.count(NativeCall::Close), 1);
    assert_eq!(api.live_handles(), 0);
    assert_eq!(api.invalid_releases(), 0);
}

#[test]
fn test_many_documents_share_one_provider() {
    let api = Arc::new(MockApi::new());
    let docs: Vec<_> = (0..8)
        .map(|_| Document::from_bytes_with(Arc::clone(&api), &three_pages()).unwrap())
        .collect();
    assert_eq!(api.live_handles(), 8);

    for doc in &docs {
        assert_eq!(doc.extract_page(2).unwrap(), "Page three\n");
    }
    drop(docs);

    assert_eq!(api.live_handles(), 0);
    assert_eq!(api.live_allocations(), 0);
    assert_eq!(api.invalid_releases(), 0);
}

#[test]
fn test_every_operation_after_close_is_local() {
    let api = Arc::new(MockApi::new());
    let mut doc = Document::from_bytes_with(Arc::clone(&api), &three_pages()).unwrap();
    doc.close();
    let before = api.call_count();

    let errors = vec![
        doc.page_count().map(|_| ()).unwrap_err(),
        doc.len().map(|_| ()).unwrap_err(),
        doc.page_info(0).map(|_| ()).unwrap_err(),
        doc.extract_page(0).map(|_| ()).unwrap_err(),
        doc.extract_all(ExtractMode::Sequential).map(|_| ()).unwrap_err(),
        doc.extract_all(ExtractMode::Parallel).map(|_| ()).unwrap_err(),
        doc.extract_bounds(0).map(|_| ()).unwrap_err(),
    ];

    assert!(errors.iter().all(|e| e.kind() == ErrorKind::UseAfterClose));
    assert_eq!(api.call_count(), before);
    assert_eq!(api.stale_handle_uses(), 0);
}

#[test]
fn test_page_not_found_is_a_lookup_error() {
    let api = MockApi::new();
    let doc = Document::from_bytes_with(&api, &three_pages()).unwrap();

    let err = doc.extract_page(9999).unwrap_err();
    assert!(err.is_lookup());

    let io_err: std::io::Error = err.into();
    assert_eq!(io_err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_page_info_failure_is_page_not_found_not_invalid_document() {
    let api = MockApi::with_faults(MockFaults {
        page_info: true,
        ..Default::default()
    });
    let doc = Document::from_bytes_with(&api, &three_pages()).unwrap();

    let err = doc.page_info(0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PageNotFound);
}

#[test]
fn test_failures_never_leak_native_memory() {
    let api = MockApi::new();
    let doc = Document::from_bytes_with(&api, &three_pages()).unwrap();

    for faults in [
        MockFaults {
            extract: true,
            ..Default::default()
        },
        MockFaults {
            null_span_text: true,
            ..Default::default()
        },
        MockFaults {
            bounds_count: Some(4),
            ..Default::default()
        },
    ] {
        api.set_faults(faults);
        let _ = doc.extract_page(0);
        let _ = doc.extract_all(ExtractMode::Parallel);
        let _ = doc.extract_bounds(1);
        assert_eq!(api.live_allocations(), 0);
    }

    drop(doc);
    assert_eq!(api.live_handles(), 0);
    assert_eq!(api.invalid_releases(), 0);
}

#[test]
fn test_mock_engine_comes_from_mock_feature() {
    // The library only builds `zpdf::mock` with this feature; the test
    // build turns it on through the crate's dev-dependency on itself.
    assert!(cfg!(feature = "mock"));
    assert!(MockApi::new().is_recording());
}
