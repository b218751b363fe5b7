//! Page geometry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometry of a single page, as reported by the engine.
///
/// A fresh snapshot is built on every [`Document::page_info`] call;
/// nothing is cached.
///
/// [`Document::page_info`]: crate::Document::page_info
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page width in points (1 point = 1/72 inch)
    pub width: f64,

    /// Page height in points
    pub height: f64,

    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: i32,
}

impl PageInfo {
    /// Create a page info snapshot.
    pub fn new(width: f64, height: f64, rotation: i32) -> Self {
        Self {
            width,
            height,
            rotation,
        }
    }

    /// Get page dimensions as (width, height) tuple.
    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Rotation normalized into `0..360`.
    pub fn normalized_rotation(&self) -> i32 {
        self.rotation.rem_euclid(360)
    }

    /// Dimensions as displayed, with width and height swapped for
    /// quarter-turn rotations.
    pub fn displayed_dimensions(&self) -> (f64, f64) {
        match self.normalized_rotation() {
            90 | 270 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }

    /// Check if the page is displayed in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        let (width, height) = self.displayed_dimensions();
        width > height
    }
}

impl fmt::Display for PageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} pt, rotated {}°",
            self.width, self.height, self.rotation
        )
    }
}
