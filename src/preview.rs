//! First-page previews
//!
//! Rasterization is delegated to PDFium through `pdfium-render`, bound at
//! run time. A preview is always best-effort: if the library cannot be
//! loaded or the bytes do not render, the caller gets a text placeholder.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use pdfium_render::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

/// Default scale factor applied to the page's point size
pub const PREVIEW_SCALE: f32 = 1.5;

/// Why a preview could not be produced. Never leaves this module.
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("render engine unavailable: {0}")]
    Unavailable(String),

    #[error("render failed: {0}")]
    Render(#[from] PdfiumError),

    #[error("bitmap encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("document has no pages")]
    NoPages,

    #[error("bitmap has unexpected size")]
    Bitmap,
}

/// A rendered preview, or the text shown in its place
#[derive(Debug, Clone)]
pub enum Preview {
    Image { width: u32, height: u32, png: Vec<u8> },
    Placeholder(String),
}

impl Preview {
    pub fn is_image(&self) -> bool {
        matches!(self, Preview::Image { .. })
    }
}

/// Something that can turn a page of a PDF into pixels
pub trait PageRasterizer {
    /// Number of pages in the document
    fn page_count(&self, bytes: &[u8]) -> Result<usize, PreviewError>;

    /// Render one page (0-based) at `scale`
    fn rasterize(&self, bytes: &[u8], page_index: usize, scale: f32) -> Result<RgbaImage, PreviewError>;
}

/// PDFium-backed rasterizer
///
/// Binding is attempted once at construction; when it fails every preview
/// becomes a placeholder.
pub struct PdfiumRasterizer {
    pdfium: Option<Pdfium>,
    bind_error: Option<String>,
}

impl PdfiumRasterizer {
    /// Look for libpdfium next to the executable's working directory, then
    /// in system library paths
    pub fn bind() -> Self {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library());

        match bindings {
            Ok(bindings) => Self {
                pdfium: Some(Pdfium::new(bindings)),
                bind_error: None,
            },
            Err(e) => {
                debug!(error = %e, "PDFium not available, previews disabled");
                Self {
                    pdfium: None,
                    bind_error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.pdfium.is_some()
    }

    fn pdfium(&self) -> Result<&Pdfium, PreviewError> {
        self.pdfium.as_ref().ok_or_else(|| {
            PreviewError::Unavailable(self.bind_error.clone().unwrap_or_else(|| "not bound".to_string()))
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn page_count(&self, bytes: &[u8]) -> Result<usize, PreviewError> {
        let document = self.pdfium()?.load_pdf_from_byte_slice(bytes, None)?;
        Ok(document.pages().len() as usize)
    }

    fn rasterize(&self, bytes: &[u8], page_index: usize, scale: f32) -> Result<RgbaImage, PreviewError> {
        let document = self.pdfium()?.load_pdf_from_byte_slice(bytes, None)?;
        let page = document.pages().get(page_index as _)?;
        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page.render_with_config(&config)?;

        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or(PreviewError::Bitmap)
    }
}

/// Render the requested page (1-based) of `bytes` as a PNG preview
///
/// Out-of-range page numbers fall back to page 1. Failures are logged and
/// turned into a placeholder.
pub fn render_preview(rasterizer: &dyn PageRasterizer, bytes: &[u8], page_number: usize, scale: f32) -> Preview {
    match try_render(rasterizer, bytes, page_number, scale) {
        Ok(preview) => preview,
        Err(e) => {
            warn!(error = %e, "preview failed");
            Preview::Placeholder("Preview not available".to_string())
        }
    }
}

fn try_render(
    rasterizer: &dyn PageRasterizer,
    bytes: &[u8],
    page_number: usize,
    scale: f32,
) -> Result<Preview, PreviewError> {
    let page_count = rasterizer.page_count(bytes)?;
    if page_count == 0 {
        return Err(PreviewError::NoPages);
    }

    let page_index = if (1..=page_count).contains(&page_number) {
        page_number - 1
    } else {
        0
    };

    let bitmap = rasterizer.rasterize(bytes, page_index, scale)?;
    let (width, height) = bitmap.dimensions();

    let mut png = Vec::new();
    bitmap.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    debug!(page = page_index + 1, width, height, "rendered preview");

    Ok(Preview::Image { width, height, png })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Rasterizer that records which page it was asked for
    struct FakeRasterizer {
        pages: usize,
        rendered: Cell<Option<usize>>,
    }

    impl PageRasterizer for FakeRasterizer {
        fn page_count(&self, _bytes: &[u8]) -> Result<usize, PreviewError> {
            Ok(self.pages)
        }

        fn rasterize(&self, _bytes: &[u8], page_index: usize, scale: f32) -> Result<RgbaImage, PreviewError> {
            self.rendered.set(Some(page_index));
            let side = (10.0 * scale) as u32;
            Ok(RgbaImage::new(side, side))
        }
    }

    struct BrokenRasterizer;

    impl PageRasterizer for BrokenRasterizer {
        fn page_count(&self, _bytes: &[u8]) -> Result<usize, PreviewError> {
            Err(PreviewError::Unavailable("missing".to_string()))
        }

        fn rasterize(&self, _bytes: &[u8], _page_index: usize, _scale: f32) -> Result<RgbaImage, PreviewError> {
            Err(PreviewError::Bitmap)
        }
    }

    #[test]
    fn test_renders_requested_page() {
        let fake = FakeRasterizer { pages: 3, rendered: Cell::new(None) };
        let preview = render_preview(&fake, b"", 2, PREVIEW_SCALE);
        assert!(preview.is_image());
        assert_eq!(fake.rendered.get(), Some(1));
    }

    #[test]
    fn test_out_of_range_falls_back_to_first_page() {
        let fake = FakeRasterizer { pages: 3, rendered: Cell::new(None) };
        render_preview(&fake, b"", 9, PREVIEW_SCALE);
        assert_eq!(fake.rendered.get(), Some(0));

        render_preview(&fake, b"", 0, PREVIEW_SCALE);
        assert_eq!(fake.rendered.get(), Some(0));
    }

    #[test]
    fn test_scale_is_applied() {
        let fake = FakeRasterizer { pages: 1, rendered: Cell::new(None) };
        match render_preview(&fake, b"", 1, PREVIEW_SCALE) {
            Preview::Image { width, height, png } => {
                assert_eq!((width, height), (15, 15));
                assert!(png.starts_with(b"\x89PNG"));
            }
            Preview::Placeholder(text) => panic!("unexpected placeholder: {text}"),
        }
    }

    #[test]
    fn test_failure_becomes_placeholder() {
        assert!(matches!(render_preview(&BrokenRasterizer, b"", 1, PREVIEW_SCALE), Preview::Placeholder(_)));
    }

    #[test]
    fn test_pdfium_on_garbage_never_panics() {
        // Either the library is missing or the bytes do not parse
        let rasterizer = PdfiumRasterizer::bind();
        let preview = render_preview(&rasterizer, b"not a pdf", 1, PREVIEW_SCALE);
        assert!(!preview.is_image());
    }
}
