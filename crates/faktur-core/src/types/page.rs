//! Rasterized page type.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single rasterized page ready for OCR.
///
/// The pixel data is PNG-encoded so that pages can cross the engine boundary
/// (HTTP upload, process handoff) without re-encoding. Pages are consumed
/// once by the OCR adapter and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageImage {
    /// Zero-based index of the page within the source document.
    pub page_index: u32,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// PNG-encoded pixel buffer.
    pub png_data: Bytes,
}

impl PageImage {
    /// Creates a page from an encoded PNG buffer.
    pub fn new(page_index: u32, width: u32, height: u32, png_data: impl Into<Bytes>) -> Self {
        Self {
            page_index,
            width,
            height,
            png_data: png_data.into(),
        }
    }

    /// Encoded size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.png_data.len()
    }
}
