//! Size reduction by re-serializing with compression

use std::fmt;
use std::str::FromStr;

use lopdf::{Document, Object};
use tracing::{debug, instrument};

use crate::error::Error;

/// How aggressively to shrink the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Flate-compress every stream
    Low,
    /// Also drop empty streams and unreachable objects
    #[default]
    Medium,
    /// Also strip embedded XMP metadata, page thumbnails and piece info
    High,
}

impl FromStr for CompressionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(Error::General(format!(
                "Invalid compression level: {s}. Must be one of: low, medium, high"
            ))),
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Apply the compression passes for `level` in place
#[instrument(skip(doc))]
pub fn compress_document(doc: &mut Document, level: CompressionLevel) {
    if level == CompressionLevel::High {
        strip_auxiliary_data(doc);
    }

    if level != CompressionLevel::Low {
        doc.delete_zero_length_streams();
        let pruned = doc.prune_objects();
        debug!(pruned = pruned.len(), "pruned unreachable objects");
    }

    if level == CompressionLevel::High {
        doc.renumber_objects();
    }

    doc.compress();
}

/// Remove data that viewers do not need to display pages
fn strip_auxiliary_data(doc: &mut Document) {
    let catalog_id = doc.trailer.get(b"Root").and_then(Object::as_reference).ok();
    if let Some(catalog) = catalog_id.and_then(|id| doc.get_dictionary_mut(id).ok()) {
        catalog.remove(b"Metadata");
    }

    let pages: Vec<_> = doc.get_pages().into_values().collect();
    for page_id in pages {
        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            page.remove(b"Thumb");
            page.remove(b"PieceInfo");
            page.remove(b"Metadata");
        }
    }
}

/// Size before and after compression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionReport {
    pub original_size: u64,
    pub compressed_size: u64,
}

impl CompressionReport {
    pub fn new(original_size: u64, compressed_size: u64) -> Self {
        Self { original_size, compressed_size }
    }

    /// `round((1 - compressed / original) * 100)`; negative when the output grew
    pub fn reduction_percent(&self) -> i64 {
        if self.original_size == 0 {
            return 0;
        }
        let ratio = self.compressed_size as f64 / self.original_size as f64;
        ((1.0 - ratio) * 100.0).round() as i64
    }

    /// Whether there is a reduction worth announcing
    pub fn is_reduction(&self) -> bool {
        self.reduction_percent() > 0
    }

    /// Success message, only when the file actually shrank
    pub fn success_message(&self) -> Option<String> {
        self.is_reduction()
            .then(|| format!("File size reduced by {}%", self.reduction_percent()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Size;
    use crate::pdf::create::create_labelled_document;

    #[test]
    fn test_reduction_percent() {
        assert_eq!(CompressionReport::new(1000, 600).reduction_percent(), 40);
        assert_eq!(CompressionReport::new(1000, 1000).reduction_percent(), 0);
        assert_eq!(CompressionReport::new(1000, 1100).reduction_percent(), -10);
        // 1 - 2/3 = 33.3%
        assert_eq!(CompressionReport::new(3, 2).reduction_percent(), 33);
        assert_eq!(CompressionReport::new(0, 10).reduction_percent(), 0);
    }

    #[test]
    fn test_no_success_message_without_reduction() {
        assert!(CompressionReport::new(1000, 1000).success_message().is_none());
        assert!(CompressionReport::new(1000, 1200).success_message().is_none());
        // 0.4% rounds to 0
        assert!(CompressionReport::new(1000, 996).success_message().is_none());
        assert_eq!(
            CompressionReport::new(1000, 500).success_message().as_deref(),
            Some("File size reduced by 50%")
        );
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("HIGH".parse::<CompressionLevel>().unwrap(), CompressionLevel::High);
        assert!("extreme".parse::<CompressionLevel>().is_err());
    }

    #[test]
    fn test_every_level_keeps_pages() {
        for level in [CompressionLevel::Low, CompressionLevel::Medium, CompressionLevel::High] {
            let mut doc = create_labelled_document("A", 3, Size::letter());
            compress_document(&mut doc, level);
            assert_eq!(doc.get_pages().len(), 3, "level {level}");
        }
    }
}
