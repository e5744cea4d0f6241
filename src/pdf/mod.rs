//! PDF manipulation module
//!
//! Thin wrappers over the lopdf document model. Each tool takes a loaded
//! [`lopdf::Document`] and transforms it in place (or, for merging, builds a
//! new one); [`document`] handles the byte-level load and save.

pub mod compress;
pub mod create;
pub mod document;
pub mod draw;
pub mod encrypt;
pub mod font;
pub mod merge;
pub mod metadata;
pub mod numbering;
pub mod page;
pub mod watermark;

// Re-export commonly used items
pub use compress::{compress_document, CompressionLevel, CompressionReport};
pub use document::{load_document, save_document};
pub use draw::Rgb;
pub use encrypt::{encrypt_document, password_strength, validate_passwords, DocumentPermissions, PasswordStrength};
pub use merge::merge_documents;
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
pub use numbering::{add_page_numbers, format_page_label, PageNumberOptions};
pub use watermark::{add_image_watermark, add_text_watermark, embed_image, ImageWatermarkOptions, TextWatermarkOptions};
