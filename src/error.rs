//! Error types for the PDF tools library

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF tools library
///
/// Variants fall into two groups: input validation errors, which are raised
/// before any file is read, and processing errors, which come out of the
/// document engine or the filesystem. See [`Error::is_input_validation`].
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// No file selected for a tool
    #[error("Please select a PDF file.")]
    NoFileSelected,

    /// File rejected by the intake check
    #[error("Not a PDF file: {0}")]
    NotPdf(String),

    /// Watermark image missing
    #[error("Please select an image for the watermark.")]
    NoImageSelected,

    /// Watermark image is neither JPEG nor PNG
    #[error("Only JPEG and PNG images are supported: {0}")]
    UnsupportedImage(String),

    /// Empty password
    #[error("Please enter a password.")]
    EmptyPassword,

    /// Password below the configured minimum length
    #[error("Password must be at least {0} characters long.")]
    PasswordTooShort(usize),

    /// Password and confirmation differ
    #[error("Passwords do not match.")]
    PasswordMismatch,

    /// Invalid colour specification
    #[error("Invalid colour: {0}")]
    InvalidColor(String),

    /// Tool is already running
    #[error("{0} is already running")]
    Busy(String),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {0}")]
    EmptyPdf(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether this error was raised by a precondition check, before any
    /// file was read or handed to the document engine.
    pub fn is_input_validation(&self) -> bool {
        matches!(
            self,
            Error::NoFileSelected
                | Error::NotPdf(_)
                | Error::NoImageSelected
                | Error::UnsupportedImage(_)
                | Error::EmptyPassword
                | Error::PasswordTooShort(_)
                | Error::PasswordMismatch
                | Error::InvalidColor(_)
                | Error::Busy(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(Error::PasswordMismatch.is_input_validation());
        assert!(Error::NoFileSelected.is_input_validation());
        assert!(!Error::General("boom".into()).is_input_validation());
        assert!(!Error::EmptyPdf("a.pdf".into()).is_input_validation());
    }
}
