//! File intake: accepted, not-yet-processed input files
//!
//! A [`PendingFile`] records what was selected (name, size, MIME type) without
//! reading the content. Bytes are loaded on demand when a tool runs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Where a pending file's bytes come from
#[derive(Debug, Clone)]
enum FileSource {
    Disk(PathBuf),
    Memory(Arc<[u8]>),
}

/// An accepted input file
#[derive(Debug, Clone)]
pub struct PendingFile {
    id: Uuid,
    name: String,
    byte_size: u64,
    mime_type: String,
    source: FileSource,
}

impl PendingFile {
    /// Reference a file on disk. Only metadata is read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            id: Uuid::new_v4(),
            mime_type: mime_from_name(&name).to_string(),
            name,
            byte_size: metadata.len(),
            source: FileSource::Disk(path.to_path_buf()),
        })
    }

    /// Wrap a buffer that is already in memory
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let bytes = bytes.into();
        Self {
            id: Uuid::new_v4(),
            mime_type: mime_from_name(&name).to_string(),
            name,
            byte_size: bytes.len() as u64,
            source: FileSource::Memory(bytes),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Name without its final extension
    pub fn base_name(&self) -> &str {
        base_name(&self.name)
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type.contains("pdf")
    }

    pub fn is_jpeg(&self) -> bool {
        self.mime_type == "image/jpeg"
    }

    pub fn is_png(&self) -> bool {
        self.mime_type == "image/png"
    }

    /// Read the file content
    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.source {
            FileSource::Disk(path) => {
                debug!(file = %self.name, "reading from disk");
                Ok(tokio::fs::read(path).await?)
            }
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

impl fmt::Display for PendingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, format_file_size(self.byte_size))
    }
}

/// Accept a file as primary PDF input
pub fn accept_pdf(file: PendingFile) -> Result<PendingFile> {
    if file.is_pdf() {
        Ok(file)
    } else {
        Err(Error::NotPdf(file.name))
    }
}

/// Accept a file as a watermark image (JPEG or PNG)
pub fn accept_image(file: PendingFile) -> Result<PendingFile> {
    if file.is_jpeg() || file.is_png() {
        Ok(file)
    } else {
        Err(Error::UnsupportedImage(file.name))
    }
}

/// Single-slot holder for tools that work on one file
///
/// Selecting a new file replaces and drops the previous one.
#[derive(Debug, Default)]
pub struct FileSlot {
    current: Option<PendingFile>,
}

impl FileSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a PDF; a rejected file leaves the slot unchanged
    pub fn select(&mut self, file: PendingFile) -> Result<()> {
        self.current = Some(accept_pdf(file)?);
        Ok(())
    }

    /// Select a watermark image; a rejected file leaves the slot unchanged
    pub fn select_image(&mut self, file: PendingFile) -> Result<()> {
        self.current = Some(accept_image(file)?);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn get(&self) -> Option<&PendingFile> {
        self.current.as_ref()
    }

    /// Whether the tool fed by this slot can run
    pub fn is_action_enabled(&self) -> bool {
        self.current.is_some()
    }
}

/// MIME type guessed from a file extension
pub fn mime_from_name(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// File name without its final extension; names without one are returned whole
pub fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Format a byte count as e.g. `1.5 MB`
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut exponent = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exponent < UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }

    // Two decimals, trailing zeros dropped
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}
