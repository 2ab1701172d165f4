//! Recognized text fragments with positional information.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box of a recognized fragment, in page pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
}

impl BoundingBox {
    /// Creates a bounding box from its left/top corner and dimensions.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point of the box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Bottom edge coordinate.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Euclidean distance between the centers of two boxes.
    pub fn center_distance(&self, other: &BoundingBox) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }
}

/// One recognized text run as reported by the OCR capability.
///
/// Fragments arrive roughly in reading order (top-to-bottom, left-to-right),
/// but skewed scans can reorder them; consumers must not rely on a stricter
/// ordering than the engine provides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFragment {
    /// Recognized text content.
    pub text: String,
    /// Location of the text on the page.
    pub bounds: BoundingBox,
    /// Engine confidence in `[0, 1]`, passed through unmodified.
    pub confidence: f32,
    /// Zero-based index of the source page.
    pub page_index: u32,
}

impl TextFragment {
    /// Creates a fragment.
    pub fn new(
        text: impl Into<String>,
        bounds: BoundingBox,
        confidence: f32,
        page_index: u32,
    ) -> Self {
        Self {
            text: text.into(),
            bounds,
            confidence,
            page_index,
        }
    }

    /// Returns whether the fragment carries any non-whitespace text.
    #[inline]
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
