//! Positioned text spans.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A run of extracted text with its bounding box.
///
/// Coordinates are in page-geometry units. The engine guarantees
/// `x1 >= x0` and `y1 >= y0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,

    /// Extracted text (may be empty)
    pub text: String,

    /// Font size in points
    pub font_size: f64,
}

impl TextSpan {
    /// Create a new span.
    pub fn new(
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        text: impl Into<String>,
        font_size: f64,
    ) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            text: text.into(),
            font_size,
        }
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Bounding box as `(x0, y0, x1, y1)`.
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        (self.x0, self.y0, self.x1, self.y1)
    }

    /// Check if a point lies inside the bounding box (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.1}, {:.1}, {:.1}, {:.1}] {:.1}pt {:?}",
            self.x0, self.y0, self.x1, self.y1, self.font_size, self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_dimensions() {
        let span = TextSpan::new(72.0, 100.0, 172.0, 112.0, "Hello", 12.0);
        assert_eq!(span.width(), 100.0);
        assert_eq!(span.height(), 12.0);
        assert_eq!(span.bbox(), (72.0, 100.0, 172.0, 112.0));
    }

    #[test]
    fn test_span_contains() {
        let span = TextSpan::new(0.0, 0.0, 10.0, 10.0, "x", 10.0);
        assert!(span.contains(5.0, 5.0));
        assert!(span.contains(10.0, 0.0));
        assert!(!span.contains(10.5, 5.0));
    }

    #[test]
    fn test_empty_span() {
        let span = TextSpan::new(0.0, 0.0, 0.0, 0.0, "", 0.0);
        assert!(span.is_empty());
        assert_eq!(span.width(), 0.0);
    }

    #[test]
    fn test_display() {
        let span = TextSpan::new(72.0, 72.0, 102.0, 84.0, "Hi", 12.0);
        assert_eq!(span.to_string(), "[72.0, 72.0, 102.0, 84.0] 12.0pt \"Hi\"");
    }
}
