//! PDF Tools CLI
//!
//! Merge, number, watermark, compress and encrypt PDFs from the command line.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use tracing_subscriber::EnvFilter;

use pdf_tools::config::Settings;
use pdf_tools::feedback::{ActionControl, ConsoleFeedback, Feedback};
use pdf_tools::intake::{format_file_size, PendingFile};
use pdf_tools::layout::{Anchor, Size};
use pdf_tools::orchestrator::{Orchestrator, ToolOutcome, ToolRequest};
use pdf_tools::ordering::OrderedFileList;
use pdf_tools::pdf::create::create_labelled_document;
use pdf_tools::pdf::{
    extract_metadata, load_document, password_strength, save_document, CompressionLevel, DocumentPermissions,
    ImageWatermarkOptions, PageNumberOptions, Rgb, TextWatermarkOptions,
};
use pdf_tools::preview::{render_preview, PdfiumRasterizer, Preview};

/// Environment variable holding the log filter
const LOG_ENV: &str = "PDF_TOOLS_LOG";

/// Environment variables read when `--password` / `--confirm` are omitted,
/// which keeps passwords out of shell history and process listings
const PASSWORD_ENV: &str = "PDF_TOOLS_PASSWORD";
const CONFIRM_ENV: &str = "PDF_TOOLS_PASSWORD_CONFIRM";

/// PDF Tools - merge, number, watermark, compress and encrypt PDFs
#[derive(Parser)]
#[command(name = "pdf-tools")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge PDFs in the given order
    pdf-tools merge intro.pdf \"chapter-*.pdf\" appendix.pdf

    # Number pages as \"Page 3 of 12\"
    pdf-tools page-numbers report.pdf --format \"Page n of total\"

    # Tile a diagonal text watermark
    pdf-tools watermark report.pdf --text DRAFT --position tile

    # Password-protect, allowing printing only
    PDF_TOOLS_PASSWORD=s3cret! PDF_TOOLS_PASSWORD_CONFIRM=s3cret! pdf-tools encrypt report.pdf --allow-print")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Settings file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for results (overrides the settings file)
    #[arg(short = 'd', long, global = true)]
    output_dir: Option<PathBuf>,

    /// Also write a PNG preview of the result's first page
    #[arg(long, global = true)]
    preview: Option<PathBuf>,

    /// Open the result after creation
    #[arg(long, global = true)]
    open: bool,

    /// Log debug output (PDF_TOOLS_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge PDF files into one, in the order given
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Add page numbers to every page
    PageNumbers {
        /// Input PDF file
        input: PathBuf,

        /// Label template; `n` is the page number and `total` the page count
        #[arg(long, default_value = "n")]
        format: String,

        /// Number printed on the first page
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        start: i64,

        /// top-left, top-center, top-right, bottom-left, bottom-center, bottom-right or center
        #[arg(long, default_value = "bottom-center")]
        position: String,

        /// Font size in points
        #[arg(long, default_value_t = 12.0)]
        font_size: f32,
    },

    /// Stamp a text or image watermark on every page
    Watermark {
        /// Input PDF file
        input: PathBuf,

        /// Watermark text
        #[arg(long, conflicts_with = "image", required_unless_present = "image")]
        text: Option<String>,

        /// Watermark image (JPEG or PNG)
        #[arg(long)]
        image: Option<PathBuf>,

        /// Anchor on the page, or `tile` to repeat over the whole page
        #[arg(long, default_value = "center")]
        position: String,

        /// Opacity in percent
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u8).range(0..=100))]
        opacity: u8,

        /// Text size in points
        #[arg(long, default_value_t = 50.0)]
        font_size: f32,

        /// Text colour as #rrggbb
        #[arg(long, default_value = "#808080")]
        color: String,

        /// Text rotation in degrees, counter-clockwise
        #[arg(long, default_value_t = 45.0, allow_negative_numbers = true)]
        rotation: f32,

        /// Image scale in percent of its pixel size
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u16).range(1..=1000))]
        scale: u16,
    },

    /// Shrink a PDF
    Compress {
        /// Input PDF file
        input: PathBuf,

        /// low, medium or high
        #[arg(long, default_value = "medium")]
        level: String,
    },

    /// Password-protect a PDF
    Encrypt {
        /// Input PDF file
        input: PathBuf,

        /// Password required to open the document
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: String,

        /// The same password again
        #[arg(long, env = CONFIRM_ENV, hide_env_values = true)]
        confirm: String,

        /// Allow printing
        #[arg(long)]
        allow_print: bool,

        /// Allow modifying the content
        #[arg(long)]
        allow_modify: bool,

        /// Allow copying text and images
        #[arg(long)]
        allow_copy: bool,

        /// Allow adding annotations
        #[arg(long)]
        allow_annotate: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },

    /// Render one page of a PDF as PNG
    Preview {
        /// PDF file to render
        input: PathBuf,

        /// Page number; out-of-range pages render page 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check that the document and render engines work
    Doctor,
}

/// An error that has already been shown to the user
#[derive(Debug, thiserror::Error)]
#[error("tool failed")]
struct AlreadyReported;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(e) = run(cli).await {
        if !e.is::<AlreadyReported>() {
            eprintln!("Error: {e:#}");
        }
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "pdf_tools=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.global.config {
        Some(path) => Settings::load(path)
            .await
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(dir) = &cli.global.output_dir {
        settings.output_dir = dir.clone();
    }

    match cli.command {
        Commands::Merge { inputs } => cmd_merge(&cli.global, settings, inputs).await,
        Commands::PageNumbers {
            input,
            format,
            start,
            position,
            font_size,
        } => {
            let options = PageNumberOptions {
                format,
                start_from: start,
                position: parse_anchor(&position)?,
                font_size,
                margin: settings.page_number_margin,
            };
            if options.position == Anchor::Tiled {
                bail!("Page numbers cannot be tiled");
            }
            let file = Some(open_input(&input).await?);
            run_tool(&cli.global, settings, "Add Page Numbers", ToolRequest::PageNumbers { file, options }).await
        }
        Commands::Watermark {
            input,
            text,
            image,
            position,
            opacity,
            font_size,
            color,
            rotation,
            scale,
        } => {
            let position = parse_anchor(&position)?;
            let file = Some(open_input(&input).await?);
            let request = match (text, image) {
                (Some(text), _) => {
                    let color = Rgb::from_hex(&color).ok_or(pdf_tools::Error::InvalidColor(color))?;
                    ToolRequest::TextWatermark {
                        file,
                        options: TextWatermarkOptions {
                            text,
                            font_size,
                            color,
                            opacity,
                            rotation,
                            position,
                            margin: settings.watermark_margin,
                            tile_gap: settings.text_tile_gap,
                        },
                    }
                }
                (None, image) => {
                    let image = match image {
                        Some(path) => Some(open_input(&path).await?),
                        None => None,
                    };
                    ToolRequest::ImageWatermark {
                        file,
                        image,
                        options: ImageWatermarkOptions {
                            scale,
                            opacity,
                            position,
                            margin: settings.watermark_margin,
                            tile_gap: settings.image_tile_gap,
                        },
                    }
                }
            };
            run_tool(&cli.global, settings, "Add Watermark", request).await
        }
        Commands::Compress { input, level } => {
            let level: CompressionLevel = level.parse()?;
            let file = Some(open_input(&input).await?);
            run_tool(&cli.global, settings, "Compress PDF", ToolRequest::Compress { file, level }).await
        }
        Commands::Encrypt {
            input,
            password,
            confirm,
            allow_print,
            allow_modify,
            allow_copy,
            allow_annotate,
        } => {
            let strength = password_strength(&password);
            ConsoleFeedback.notice(&format!("Password strength: {} ({}/100)", strength.label, strength.score));

            let request = ToolRequest::Encrypt {
                file: Some(open_input(&input).await?),
                password,
                confirmation: confirm,
                permissions: DocumentPermissions {
                    printing: allow_print,
                    modifying: allow_modify,
                    copying: allow_copy,
                    annotating: allow_annotate,
                },
            };
            run_tool(&cli.global, settings, "Encrypt PDF", request).await
        }
        Commands::Info { input } => cmd_info(&input).await,
        Commands::Preview { input, page, output } => cmd_preview(&settings, &input, page, &output).await,
        Commands::Doctor => cmd_doctor(),
    }
}

fn parse_anchor(position: &str) -> Result<Anchor> {
    Ok(position.parse()?)
}

async fn open_input(path: &Path) -> Result<PendingFile> {
    PendingFile::from_path(path)
        .await
        .with_context(|| format!("Input file not found: {}", path.display()))
}

/// Expand glob patterns in input paths
///
/// Matches of one pattern are sorted; the patterns themselves keep the order
/// they were given in.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched: Vec<PathBuf> = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("Invalid pattern: {pattern}"))? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => tracing::warn!(%pattern, error = %e, "glob error"),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {pattern}");
            }
            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

async fn cmd_merge(global: &GlobalArgs, settings: Settings, inputs: Vec<String>) -> Result<()> {
    let mut list = OrderedFileList::new();
    let mut files = Vec::new();
    for path in expand_globs(inputs)? {
        files.push(open_input(&path).await?);
    }

    for skipped in list.append(files) {
        ConsoleFeedback.notice(&format!("Skipping {skipped}: not a PDF file"));
    }
    eprintln!("Merging {} PDF files...", list.len());
    for file in list.iter() {
        eprintln!("  {file}");
    }

    run_tool(global, settings, "Merge PDFs", ToolRequest::Merge { files: list.snapshot() }).await
}

/// Run one tool and handle `--preview` and `--open`
async fn run_tool(global: &GlobalArgs, settings: Settings, label: &str, request: ToolRequest) -> Result<()> {
    let feedback = ConsoleFeedback;
    let control = ActionControl::new(label);
    let rasterizer = global.preview.as_ref().map(|_| PdfiumRasterizer::bind());

    let mut orchestrator = Orchestrator::new(settings, &feedback);
    if let Some(rasterizer) = &rasterizer {
        orchestrator = orchestrator.with_preview(rasterizer);
    }

    let outcome = match orchestrator.run(&control, request).await {
        Ok(outcome) => outcome,
        Err(_) => return Err(AlreadyReported.into()),
    };

    if let Some(path) = &global.preview {
        write_preview(&feedback, &outcome, path).await?;
    }
    if global.open {
        open_file(&outcome.path)?;
    }
    Ok(())
}

async fn write_preview(feedback: &dyn Feedback, outcome: &ToolOutcome, path: &Path) -> Result<()> {
    match &outcome.preview {
        Some(Preview::Image { png, .. }) => {
            tokio::fs::write(path, png)
                .await
                .with_context(|| format!("Failed to write preview to {}", path.display()))?;
            eprintln!("Preview: {}", path.display());
        }
        Some(Preview::Placeholder(text)) => feedback.notice(text),
        None => {}
    }
    Ok(())
}

/// Show information about a PDF
async fn cmd_info(input: &Path) -> Result<()> {
    let file = open_input(input).await?;
    let bytes = file.read_bytes().await?;
    let metadata = extract_metadata(&bytes, file.name())
        .with_context(|| format!("Failed to read {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(file.byte_size()));
    println!("Version: {}", metadata.version);
    println!("Pages: {}", metadata.page_count);
    println!("Encrypted: {}", if metadata.encrypted { "yes" } else { "no" });

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }
    if let Some(producer) = metadata.producer {
        println!("Producer: {}", producer);
    }

    Ok(())
}

/// Render a page of an existing PDF
async fn cmd_preview(settings: &Settings, input: &Path, page: usize, output: &Path) -> Result<()> {
    let file = open_input(input).await?;
    let bytes = file.read_bytes().await?;
    let rasterizer = PdfiumRasterizer::bind();

    match render_preview(&rasterizer, &bytes, page, settings.preview_scale) {
        Preview::Image { png, width, height } => {
            tokio::fs::write(output, png)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{} ({width}x{height})", output.display());
            Ok(())
        }
        Preview::Placeholder(text) => bail!("{text}"),
    }
}

/// Exercise both engines without touching user files
fn cmd_doctor() -> Result<()> {
    let mut doc = create_labelled_document("doctor", 1, Size::letter());
    let bytes = save_document(&mut doc).context("Document engine cannot save")?;
    let reloaded = load_document(&bytes, "doctor.pdf").context("Document engine cannot load")?;
    println!("Document engine: ok ({} page, {})", reloaded.get_pages().len(), format_file_size(bytes.len() as u64));

    let rasterizer = PdfiumRasterizer::bind();
    if rasterizer.is_available() {
        println!("Render engine: ok");
    } else {
        println!("Render engine: unavailable (previews will show a placeholder)");
    }
    Ok(())
}
