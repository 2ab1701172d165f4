//! Attachment normalization into rasterized pages.

use std::io::Cursor;

use bytes::Bytes;
use faktur_core::types::{Attachment, MediaType, PageImage};
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

use crate::{DocumentError, Result, TRACING_TARGET};

/// Default rasterization density for PDF pages, in dots per inch.
///
/// Sufficient for printed invoice text.
pub const DEFAULT_TARGET_DPI: u32 = 200;

/// Default maximum number of pages accepted from a single document.
pub const DEFAULT_MAX_PAGES: u32 = 16;

const MIN_TARGET_DPI: u32 = 72;
const MAX_TARGET_DPI: u32 = 600;

/// Configuration for the document loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Rasterization density for PDF pages. Clamped to 72-600.
    pub target_dpi: u32,
    /// Upper bound on pages per document.
    pub max_pages: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            target_dpi: DEFAULT_TARGET_DPI,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl LoaderConfig {
    /// Sets the target DPI, clamped to the supported range.
    pub fn with_target_dpi(mut self, dpi: u32) -> Self {
        self.target_dpi = dpi.clamp(MIN_TARGET_DPI, MAX_TARGET_DPI);
        self
    }

    /// Sets the page budget.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }
}

/// Normalizes one attachment into a sequence of rasterized pages.
///
/// Supported inputs are the image formats in [`MediaType`] (one page each)
/// and PDF (one page per embedded page). Pages are PNG-encoded in memory;
/// nothing touches the disk.
///
/// `load` is synchronous and CPU-bound. Callers on an async runtime wrap it
/// in `tokio::task::spawn_blocking`; PDFium must not run on a reactor
/// thread.
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    config: LoaderConfig,
}

impl DocumentLoader {
    /// Creates a loader with the given configuration.
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Returns the loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Normalizes an attachment into one page image per document page.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::UnsupportedFormat`] when the declared media type
    ///   is neither a supported image format nor PDF.
    /// - [`DocumentError::CorruptDocument`] when decoding fails.
    /// - [`DocumentError::PageLimitExceeded`] when a PDF carries more pages
    ///   than the configured budget.
    pub fn load(&self, attachment: &Attachment) -> Result<Vec<PageImage>> {
        let media_type = attachment.resolved_media_type().ok_or_else(|| {
            DocumentError::UnsupportedFormat {
                media_type: attachment.media_type().to_string(),
            }
        })?;

        debug!(
            target: TRACING_TARGET,
            media_type = %media_type,
            size = attachment.size(),
            "Normalizing attachment"
        );

        match media_type {
            MediaType::Pdf => self.load_pdf(attachment.bytes()),
            _ => self.load_image(attachment.bytes()).map(|page| vec![page]),
        }
    }

    /// Decodes a single-page image attachment.
    fn load_image(&self, bytes: &Bytes) -> Result<PageImage> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| DocumentError::corrupt("image decode failed", e))?;

        encode_page(&decoded, 0)
    }

    /// Rasterizes every page of a PDF attachment.
    fn load_pdf(&self, bytes: &Bytes) -> Result<Vec<PageImage>> {
        // Garbage payloads are classified without binding the rasterizer.
        if !bytes.starts_with(b"%PDF-") {
            return Err(DocumentError::corrupt_message("missing PDF header"));
        }

        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| DocumentError::corrupt("PDF parse failed", PdfiumErrorWrapper(e)))?;

        let page_count = document.pages().len() as u32;
        if page_count > self.config.max_pages {
            return Err(DocumentError::PageLimitExceeded {
                count: page_count,
                limit: self.config.max_pages,
            });
        }

        info!(
            target: TRACING_TARGET,
            pages = page_count,
            dpi = self.config.target_dpi,
            "Rasterizing PDF"
        );

        let mut pages = Vec::with_capacity(page_count as usize);
        for (index, page) in document.pages().iter().enumerate() {
            let raster = self.rasterize_page(&page, index as u32)?;
            pages.push(raster);
        }

        Ok(pages)
    }

    fn rasterize_page(&self, page: &PdfPage<'_>, index: u32) -> Result<PageImage> {
        // PDF points are 1/72 inch; scale to the target density.
        let scale = self.config.target_dpi as f32 / 72.0;
        let width_px = (page.width().value * scale).round().max(1.0) as i32;
        let height_px = (page.height().value * scale).round().max(1.0) as i32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px)
            .set_maximum_height(height_px);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            warn!(target: TRACING_TARGET, page = index, error = ?e, "Page render failed");
            DocumentError::corrupt(
                format!("failed to rasterize page {index}"),
                PdfiumErrorWrapper(e),
            )
        })?;

        encode_page(&bitmap.as_image(), index)
    }
}

/// PNG-encodes a decoded raster into a [`PageImage`].
fn encode_page(decoded: &DynamicImage, index: u32) -> Result<PageImage> {
    let mut buffer = Cursor::new(Vec::new());
    decoded
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| DocumentError::corrupt("PNG encode failed", e))?;

    Ok(PageImage::new(
        index,
        decoded.width(),
        decoded.height(),
        buffer.into_inner(),
    ))
}

/// Binds the PDFium library, preferring a system install.
fn bind_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_system_library()
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        })
        .map_err(|e| DocumentError::RasterizerUnavailable {
            message: format!("failed to load PDFium library: {e:?}"),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Newtype so PDFium's error type can travel as a boxed source.
#[derive(Debug)]
struct PdfiumErrorWrapper(PdfiumError);

impl std::fmt::Display for PdfiumErrorWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl std::error::Error for PdfiumErrorWrapper {}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_attachment(sender: &str) -> Attachment {
        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 255, 255, 255]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        Attachment::new(buffer.into_inner(), "image/png", sender).unwrap()
    }

    #[test]
    fn test_image_attachment_yields_single_page() {
        let loader = DocumentLoader::default();
        let pages = loader.load(&png_attachment("whatsapp:+4917012345678")).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_index, 0);
        assert_eq!(pages[0].width, 8);
        assert_eq!(pages[0].height, 8);
        assert!(!pages[0].png_data.is_empty());
    }

    #[test]
    fn test_undeclared_format_is_unsupported() {
        let loader = DocumentLoader::default();
        let attachment =
            Attachment::new(vec![0u8; 16], "application/zip", "whatsapp:+10000000000").unwrap();

        let err = loader.load(&attachment).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_truncated_image_is_corrupt() {
        let loader = DocumentLoader::default();
        let attachment =
            Attachment::new(vec![0x89, 0x50, 0x4e], "image/png", "whatsapp:+10000000000").unwrap();

        let err = loader.load(&attachment).unwrap_err();
        assert!(matches!(err, DocumentError::CorruptDocument { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_garbage_pdf_is_corrupt_without_rasterizer() {
        let loader = DocumentLoader::default();
        let attachment = Attachment::new(
            b"this is not a pdf".to_vec(),
            "application/pdf",
            "whatsapp:+10000000000",
        )
        .unwrap();

        let err = loader.load(&attachment).unwrap_err();
        assert!(matches!(err, DocumentError::CorruptDocument { .. }));
    }

    #[test]
    fn test_dpi_clamping() {
        let config = LoaderConfig::default().with_target_dpi(10_000);
        assert_eq!(config.target_dpi, MAX_TARGET_DPI);
        let config = LoaderConfig::default().with_target_dpi(10);
        assert_eq!(config.target_dpi, MIN_TARGET_DPI);
    }
}
