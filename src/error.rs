//! Error types for the zpdf bindings.

use std::io;
use thiserror::Error;

/// Result type alias for zpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by [`Document`](crate::Document) operations.
///
/// Every native failure sentinel (null handle, negative count, nonzero
/// status, null buffer) is translated into one of these variants at the
/// boundary. Violations that can be detected from local state are raised
/// before any native call is made.
#[derive(Error, Debug)]
pub enum Error {
    /// The document could not be opened, or the engine rejected it afterwards.
    #[error("Invalid PDF: {0}")]
    InvalidDocument(String),

    /// The page index is outside the document, either by local check or
    /// as reported by the engine.
    #[error("Page {page} not found")]
    PageNotFound {
        /// Zero-based page index that was requested.
        page: usize,
    },

    /// The engine returned no buffer for an extraction request.
    #[error("Extraction failed: {0}")]
    ExtractionFailure(String),

    /// An operation was attempted after the document was closed.
    #[error("Document is closed")]
    UseAfterClose,
}

/// Discriminant of an [`Error`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDocument,
    PageNotFound,
    ExtractionFailure,
    UseAfterClose,
}

impl Error {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidDocument(_) => ErrorKind::InvalidDocument,
            Error::PageNotFound { .. } => ErrorKind::PageNotFound,
            Error::ExtractionFailure(_) => ErrorKind::ExtractionFailure,
            Error::UseAfterClose => ErrorKind::UseAfterClose,
        }
    }

    /// Whether this is a lookup failure (a missing page).
    ///
    /// Lets callers handle a bad page index the same way they would a
    /// generic index error, without naming the zpdf-specific variant.
    /// Converting into [`io::Error`] carries the same classification as
    /// [`io::ErrorKind::NotFound`].
    pub fn is_lookup(&self) -> bool {
        matches!(self, Error::PageNotFound { .. })
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err.kind() {
            ErrorKind::PageNotFound => io::ErrorKind::NotFound,
            ErrorKind::InvalidDocument => io::ErrorKind::InvalidData,
            ErrorKind::ExtractionFailure | ErrorKind::UseAfterClose => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UseAfterClose;
        assert_eq!(err.to_string(), "Document is closed");

        let err = Error::PageNotFound { page: 9999 };
        assert_eq!(err.to_string(), "Page 9999 not found");

        let err = Error::ExtractionFailure("Failed to extract page 2".to_string());
        assert_eq!(err.to_string(), "Extraction failed: Failed to extract page 2");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            Error::InvalidDocument("x".into()).kind(),
            ErrorKind::InvalidDocument
        );
        assert_eq!(Error::PageNotFound { page: 1 }.kind(), ErrorKind::PageNotFound);
        assert_eq!(
            Error::ExtractionFailure("x".into()).kind(),
            ErrorKind::ExtractionFailure
        );
        assert_eq!(Error::UseAfterClose.kind(), ErrorKind::UseAfterClose);
    }

    #[test]
    fn test_only_page_not_found_is_lookup() {
        assert!(Error::PageNotFound { page: 0 }.is_lookup());
        assert!(!Error::InvalidDocument("x".into()).is_lookup());
        assert!(!Error::ExtractionFailure("x".into()).is_lookup());
        assert!(!Error::UseAfterClose.is_lookup());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err: io::Error = Error::PageNotFound { page: 3 }.into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
        assert_eq!(io_err.to_string(), "Page 3 not found");

        let io_err: io::Error = Error::InvalidDocument("bad header".into()).into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);

        let io_err: io::Error = Error::UseAfterClose.into();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
    }
}
