//! PDF Tools Library
//!
//! Offline PDF tools built on lopdf. This library provides functionality to:
//! - Merge multiple PDF files in a user-chosen order
//! - Add page numbers from a template such as `Page n of total`
//! - Stamp text or image watermarks, including tiled ones
//! - Compress and password-protect documents
//! - Render a first-page preview through PDFium
//!
//! # Example
//!
//! ```no_run
//! use pdf_tools::config::Settings;
//! use pdf_tools::feedback::{ActionControl, ConsoleFeedback};
//! use pdf_tools::intake::PendingFile;
//! use pdf_tools::orchestrator::{Orchestrator, ToolRequest};
//!
//! # async fn run() -> pdf_tools::Result<()> {
//! let feedback = ConsoleFeedback;
//! let orchestrator = Orchestrator::new(Settings::default(), &feedback);
//! let control = ActionControl::new("Merge PDFs");
//!
//! let files = vec![
//!     PendingFile::from_path("1. intro.pdf").await?,
//!     PendingFile::from_path("2. advanced.pdf").await?,
//! ];
//! let outcome = orchestrator.run(&control, ToolRequest::Merge { files }).await?;
//! println!("saved {}", outcome.path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod feedback;
pub mod intake;
pub mod layout;
pub mod orchestrator;
pub mod ordering;
pub mod output;
pub mod pdf;
pub mod preview;

// Re-export commonly used items
pub use error::{Error, Result};
