//! Runs one tool from selected files to a saved result
//!
//! Every run follows the same steps: check the inputs, mark the action busy,
//! read and load the files, transform the document, serialize and save it,
//! then try to render a preview. Failures are reported once through the
//! [`Feedback`] surface and the action control is released whatever happens.

use std::path::PathBuf;

use lopdf::Document;
use tracing::{error, info, instrument, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::feedback::{ActionControl, Feedback};
use crate::intake::PendingFile;
use crate::output::{merged_filename, suffixed_filename, ToolResult};
use crate::pdf::{
    add_image_watermark, add_page_numbers, add_text_watermark, compress_document, embed_image, encrypt_document,
    load_document, merge_documents, save_document, validate_passwords, CompressionLevel, CompressionReport,
    DocumentPermissions, ImageWatermarkOptions, PageNumberOptions, TextWatermarkOptions,
};
use crate::preview::{render_preview, PageRasterizer, Preview};

/// A tool invocation with its inputs and parameters
#[derive(Debug, Clone)]
pub enum ToolRequest {
    Merge {
        files: Vec<PendingFile>,
    },
    PageNumbers {
        file: Option<PendingFile>,
        options: PageNumberOptions,
    },
    TextWatermark {
        file: Option<PendingFile>,
        options: TextWatermarkOptions,
    },
    ImageWatermark {
        file: Option<PendingFile>,
        image: Option<PendingFile>,
        options: ImageWatermarkOptions,
    },
    Compress {
        file: Option<PendingFile>,
        level: CompressionLevel,
    },
    Encrypt {
        file: Option<PendingFile>,
        password: String,
        confirmation: String,
        permissions: DocumentPermissions,
    },
}

impl ToolRequest {
    /// Short name used in logs
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Merge { .. } => "merge",
            Self::PageNumbers { .. } => "page-numbers",
            Self::TextWatermark { .. } | Self::ImageWatermark { .. } => "watermark",
            Self::Compress { .. } => "compress",
            Self::Encrypt { .. } => "encrypt",
        }
    }

    /// What the user was doing, for failure messages
    fn activity(&self) -> &'static str {
        match self {
            Self::Merge { .. } => "merging PDFs",
            Self::PageNumbers { .. } => "adding page numbers",
            Self::TextWatermark { .. } | Self::ImageWatermark { .. } => "adding watermark",
            Self::Compress { .. } => "compressing the PDF",
            Self::Encrypt { .. } => "encrypting the PDF",
        }
    }

    /// Check every precondition without reading any file content
    pub fn validate(&self, settings: &Settings) -> Result<()> {
        match self {
            Self::Merge { files } => {
                if files.is_empty() {
                    return Err(Error::NoFileSelected);
                }
                files.iter().try_for_each(require_pdf)
            }
            Self::PageNumbers { file, .. } | Self::TextWatermark { file, .. } | Self::Compress { file, .. } => {
                require_selected_pdf(file.as_ref())
            }
            Self::ImageWatermark { file, image, .. } => {
                require_selected_pdf(file.as_ref())?;
                let image = image.as_ref().ok_or(Error::NoImageSelected)?;
                if image.is_jpeg() || image.is_png() {
                    Ok(())
                } else {
                    Err(Error::UnsupportedImage(image.name().to_string()))
                }
            }
            Self::Encrypt {
                file,
                password,
                confirmation,
                ..
            } => {
                require_selected_pdf(file.as_ref())?;
                validate_passwords(password, confirmation, settings.min_password_length)
            }
        }
    }
}

fn require_pdf(file: &PendingFile) -> Result<()> {
    if file.is_pdf() {
        Ok(())
    } else {
        Err(Error::NotPdf(file.name().to_string()))
    }
}

fn require_selected_pdf(file: Option<&PendingFile>) -> Result<()> {
    require_pdf(file.ok_or(Error::NoFileSelected)?)
}

/// What a successful run produced
#[derive(Debug)]
pub struct ToolOutcome {
    /// Where the result was saved
    pub path: PathBuf,
    pub preview: Option<Preview>,
    /// Size comparison, for the compress tool only
    pub compression: Option<CompressionReport>,
}

/// Drives tool runs against a feedback surface
pub struct Orchestrator<'a> {
    settings: Settings,
    feedback: &'a dyn Feedback,
    rasterizer: Option<&'a dyn PageRasterizer>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(settings: Settings, feedback: &'a dyn Feedback) -> Self {
        Self {
            settings,
            feedback,
            rasterizer: None,
        }
    }

    /// Render a first-page preview of every result
    pub fn with_preview(mut self, rasterizer: &'a dyn PageRasterizer) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run one tool while `control` is held busy
    ///
    /// Any error is reported once through the feedback surface before being
    /// returned. Input problems are shown as they are; processing failures
    /// get a generic message and the details go to the log.
    #[instrument(skip_all, fields(tool = request.tool_name()))]
    pub async fn run(&self, control: &ActionControl, request: ToolRequest) -> Result<ToolOutcome> {
        let activity = request.activity();
        let result = self.run_guarded(control, request).await;

        if let Err(e) = &result {
            if e.is_input_validation() {
                warn!(error = %e, "rejected input");
                self.feedback.error(&e.to_string());
            } else {
                error!(error = %e, "tool failed");
                self.feedback
                    .error(&format!("An error occurred while {activity}. Please try again. ({e})"));
            }
        }
        result
    }

    async fn run_guarded(&self, control: &ActionControl, request: ToolRequest) -> Result<ToolOutcome> {
        request.validate(&self.settings)?;
        let _busy = control.begin()?;

        let (result, compression) = self.execute(request).await?;
        let path = result.deliver(&self.settings.output_dir).await?;

        let preview = self
            .rasterizer
            .map(|r| render_preview(r, &result.bytes, 1, self.settings.preview_scale));

        match compression.as_ref().map(CompressionReport::success_message) {
            Some(None) => self.feedback.notice(&format!(
                "The PDF could not be made smaller; saved an optimized copy to {}",
                path.display()
            )),
            Some(Some(reduced)) => self.feedback.success(&format!(
                "PDF processed successfully! {reduced}. Saved to {}",
                path.display()
            )),
            None => self
                .feedback
                .success(&format!("PDF processed successfully! Saved to {}", path.display())),
        }

        Ok(ToolOutcome {
            path,
            preview,
            compression,
        })
    }

    async fn execute(&self, request: ToolRequest) -> Result<(ToolResult, Option<CompressionReport>)> {
        match request {
            ToolRequest::Merge { files } => {
                let mut documents = Vec::with_capacity(files.len());
                for file in &files {
                    let bytes = file.read_bytes().await?;
                    documents.push(load_document(&bytes, file.name())?);
                }
                info!(inputs = documents.len(), "merging");

                let mut merged = merge_documents(documents)?;
                let names: Vec<&str> = files.iter().map(PendingFile::name).collect();
                let bytes = save_document(&mut merged)?;
                Ok((ToolResult::new(bytes, merged_filename(&names)), None))
            }
            ToolRequest::PageNumbers { file, options } => {
                let (file, mut doc, _) = open_selected(file).await?;
                add_page_numbers(&mut doc, &options)?;
                finish(&file, &mut doc, "numbered")
            }
            ToolRequest::TextWatermark { file, options } => {
                let (file, mut doc, _) = open_selected(file).await?;
                add_text_watermark(&mut doc, &options)?;
                finish(&file, &mut doc, "watermarked")
            }
            ToolRequest::ImageWatermark { file, image, options } => {
                let (file, mut doc, _) = open_selected(file).await?;
                let image = image.ok_or(Error::NoImageSelected)?;
                let image_bytes = image.read_bytes().await?;
                let embedded = embed_image(&mut doc, &image_bytes)?;
                add_image_watermark(&mut doc, embedded, &options)?;
                finish(&file, &mut doc, "watermarked")
            }
            ToolRequest::Compress { file, level } => {
                let (file, mut doc, original_size) = open_selected(file).await?;
                compress_document(&mut doc, level);
                let (result, _) = finish(&file, &mut doc, "compressed")?;

                let report = CompressionReport::new(original_size, result.bytes.len() as u64);
                info!(
                    %level,
                    original = report.original_size,
                    compressed = report.compressed_size,
                    reduction = report.reduction_percent(),
                    "compressed"
                );
                Ok((result, Some(report)))
            }
            ToolRequest::Encrypt {
                file,
                password,
                permissions,
                ..
            } => {
                let (file, mut doc, _) = open_selected(file).await?;
                encrypt_document(&mut doc, &password, permissions)?;
                finish(&file, &mut doc, "encrypted")
            }
        }
    }
}

/// Read and load the selected file; also returns its size in bytes
async fn open_selected(file: Option<PendingFile>) -> Result<(PendingFile, Document, u64)> {
    let file = file.ok_or(Error::NoFileSelected)?;
    let bytes = file.read_bytes().await?;
    let doc = load_document(&bytes, file.name())?;
    Ok((file, doc, bytes.len() as u64))
}

fn finish(file: &PendingFile, doc: &mut Document, suffix: &str) -> Result<(ToolResult, Option<CompressionReport>)> {
    let bytes = save_document(doc)?;
    Ok((ToolResult::new(bytes, suffixed_filename(file.name(), suffix)), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{FeedbackEvent, RecordingFeedback};
    use crate::layout::Size;
    use crate::pdf::create::create_labelled_pdf;
    use tempfile::TempDir;

    fn settings_in(dir: &TempDir) -> Settings {
        Settings {
            output_dir: dir.path().to_path_buf(),
            ..Settings::default()
        }
    }

    fn pdf(name: &str, label: &str, pages: usize) -> PendingFile {
        PendingFile::from_bytes(name, create_labelled_pdf(label, pages, Size::letter()).unwrap())
    }

    #[test]
    fn test_validation_order() {
        let settings = Settings::default();

        let request = ToolRequest::Merge { files: vec![] };
        assert!(matches!(request.validate(&settings), Err(Error::NoFileSelected)));

        let request = ToolRequest::Compress {
            file: Some(PendingFile::from_bytes("notes.txt", b"hello".to_vec())),
            level: CompressionLevel::Low,
        };
        assert!(matches!(request.validate(&settings), Err(Error::NotPdf(_))));

        let request = ToolRequest::ImageWatermark {
            file: Some(pdf("a.pdf", "A", 1)),
            image: None,
            options: ImageWatermarkOptions::default(),
        };
        assert!(matches!(request.validate(&settings), Err(Error::NoImageSelected)));

        let request = ToolRequest::ImageWatermark {
            file: Some(pdf("a.pdf", "A", 1)),
            image: Some(PendingFile::from_bytes("logo.gif", b"GIF89a".to_vec())),
            options: ImageWatermarkOptions::default(),
        };
        assert!(matches!(request.validate(&settings), Err(Error::UnsupportedImage(_))));
    }

    #[tokio::test]
    async fn test_mismatched_passwords_never_run() {
        let dir = tempfile::tempdir().unwrap();
        let feedback = RecordingFeedback::new();
        let orchestrator = Orchestrator::new(settings_in(&dir), &feedback);
        let control = ActionControl::new("Encrypt PDF");

        let request = ToolRequest::Encrypt {
            file: Some(pdf("a.pdf", "A", 1)),
            password: "secret1".to_string(),
            confirmation: "secret2".to_string(),
            permissions: DocumentPermissions::default(),
        };
        let err = orchestrator.run(&control, request).await.unwrap_err();

        assert!(matches!(err, Error::PasswordMismatch));
        assert_eq!(feedback.errors(), vec!["Passwords do not match.".to_string()]);
        assert!(control.is_enabled());
        assert!(!dir.path().join("a_encrypted.pdf").exists());
    }

    #[tokio::test]
    async fn test_page_numbers_saves_result() {
        let dir = tempfile::tempdir().unwrap();
        let feedback = RecordingFeedback::new();
        let orchestrator = Orchestrator::new(settings_in(&dir), &feedback);
        let control = ActionControl::new("Add Page Numbers");

        let request = ToolRequest::PageNumbers {
            file: Some(pdf("report.pdf", "R", 2)),
            options: PageNumberOptions::default(),
        };
        let outcome = orchestrator.run(&control, request).await.unwrap();

        assert_eq!(outcome.path, dir.path().join("report_numbered.pdf"));
        assert!(outcome.path.exists());
        assert!(outcome.preview.is_none());
        assert_eq!(feedback.successes().len(), 1);
        assert!(control.is_enabled());
    }

    #[tokio::test]
    async fn test_processing_failure_restores_control() {
        let dir = tempfile::tempdir().unwrap();
        let feedback = RecordingFeedback::new();
        let orchestrator = Orchestrator::new(settings_in(&dir), &feedback);
        let control = ActionControl::new("Compress PDF");

        let request = ToolRequest::Compress {
            file: Some(PendingFile::from_bytes("broken.pdf", b"%PDF-1.4 garbage".to_vec())),
            level: CompressionLevel::Medium,
        };
        let err = orchestrator.run(&control, request).await.unwrap_err();

        assert!(!err.is_input_validation());
        assert!(control.is_enabled());
        match feedback.events().as_slice() {
            [FeedbackEvent::Error(message)] => assert!(message.starts_with("An error occurred while compressing")),
            other => panic!("unexpected feedback: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_busy_control_rejects_run() {
        let dir = tempfile::tempdir().unwrap();
        let feedback = RecordingFeedback::new();
        let orchestrator = Orchestrator::new(settings_in(&dir), &feedback);
        let control = ActionControl::new("Merge PDFs");
        let _held = control.begin().unwrap();

        let request = ToolRequest::Merge {
            files: vec![pdf("a.pdf", "A", 1)],
        };
        assert!(matches!(orchestrator.run(&control, request).await, Err(Error::Busy(_))));
        assert!(!dir.path().join("a_merged.pdf").exists());
    }
}
