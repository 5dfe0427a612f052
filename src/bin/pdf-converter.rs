//! PDF Converter CLI tool
//!
//! Runs the HTTP API, or performs the same operations on local files.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pdf_converter::engine::{LopdfEngine, PdfEngine};
use pdf_converter::pdf::inspect;
use pdf_converter::request::{
    CompressRequest, CompressionLevel, MergeRequest, PageRange, PdfBuffer, SplitRequest,
    WatermarkRequest,
};
use pdf_converter::server::{self, ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};

/// PDF Converter - merge, watermark, compress and split PDFs
#[derive(Parser)]
#[command(name = "pdf-converter")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Start the HTTP API on port 9000
    pdf-converter serve --port 9000

    # Merge numbered PDFs in order
    pdf-converter merge -o combined.pdf \"[0-9]*.pdf\"

    # Stamp every page
    pdf-converter watermark report.pdf -o draft.pdf --text DRAFT

    # Keep pages 3 to 7
    pdf-converter split book.pdf -o chapter.pdf --start 3 --end 7")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "PDF_CONVERTER_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "PDF_CONVERTER_PORT", default_value_t = 8080)]
        port: u16,

        /// Largest accepted request body in bytes
        #[arg(long, env = "PDF_CONVERTER_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
        max_upload_bytes: usize,
    },

    /// Merge multiple PDF files into one
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Overlay watermark text on every page
    Watermark {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Watermark text
        #[arg(long)]
        text: String,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Recompress a PDF
    Compress {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Compression level, 0 (none) to 9 (maximum)
        #[arg(long, default_value_t = 9, allow_negative_numbers = true)]
        level: i64,
    },

    /// Extract an inclusive page range
    Split {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// First page to keep (1-indexed)
        #[arg(long)]
        start: i64,

        /// Last page to keep (inclusive)
        #[arg(long)]
        end: i64,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { host, port, max_upload_bytes } => {
            cmd_serve(ServerConfig { host, port, max_upload_bytes })
        }
        Commands::Merge { inputs, output, open } => {
            init_logging("warn");
            cmd_merge(inputs, output, open)
        }
        Commands::Watermark { input, output, text, open } => {
            init_logging("warn");
            cmd_watermark(input, output, text, open)
        }
        Commands::Compress { input, output, level } => {
            init_logging("warn");
            cmd_compress(input, output, level)
        }
        Commands::Split { input, output, start, end } => {
            init_logging("warn");
            cmd_split(input, output, start, end)
        }
        Commands::Info { input } => {
            init_logging("warn");
            cmd_info(input)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the defaults
fn init_logging(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the HTTP API until Ctrl-C
fn cmd_serve(config: ServerConfig) -> Result<()> {
    init_logging("pdf_converter=info,tower_http=debug");

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let engine: Arc<dyn PdfEngine> = Arc::new(LopdfEngine);

    runtime.block_on(server::serve(config, engine))?;
    Ok(())
}

/// Expand glob patterns in input paths, keeping argument order
///
/// Matches for one pattern are sorted so numbered files merge in order.
/// Arguments without glob characters are taken literally.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(pattern));
            continue;
        }

        let entries = glob(&pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        let mut matched: Vec<PathBuf> = entries
            .filter_map(|entry| {
                entry
                    .map_err(|e| tracing::warn!(pattern = %pattern, error = %e, "Skipping unreadable glob match"))
                    .ok()
            })
            .collect();

        if matched.is_empty() {
            bail!("No files matched pattern: {}", pattern);
        }
        matched.sort();
        paths.append(&mut matched);
    }

    Ok(paths)
}

/// Platform command that hands a file to the desktop's default viewer
#[cfg(target_os = "macos")]
const OPENER: (&str, &[&str]) = ("open", &[]);
#[cfg(target_os = "windows")]
const OPENER: (&str, &[&str]) = ("cmd", &["/C", "start", ""]);
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const OPENER: (&str, &[&str]) = ("xdg-open", &[]);

/// Show the written PDF in the default viewer without waiting for it
fn open_file(path: &Path) -> Result<()> {
    let (program, args) = OPENER;
    std::process::Command::new(program)
        .args(args)
        .arg(path)
        .spawn()
        .with_context(|| format!("Failed to open {} with {}", path.display(), program))?;
    Ok(())
}

fn read_pdf(path: &Path) -> Result<PdfBuffer> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Input file not found: {}", path.display()))?;
    Ok(PdfBuffer::from(bytes))
}

fn write_pdf(path: &Path, pdf: &PdfBuffer) -> Result<()> {
    std::fs::write(path, pdf.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Merge multiple PDFs into one
fn cmd_merge(inputs: Vec<String>, output: PathBuf, open: bool) -> Result<()> {
    let inputs = expand_globs(inputs)?;

    eprintln!("Merging {} PDF files...", inputs.len());

    let files = inputs
        .iter()
        .map(|path| read_pdf(path))
        .collect::<Result<Vec<_>>>()?;
    let merged = LopdfEngine.merge(MergeRequest::new(files)?)?;
    write_pdf(&output, &merged)?;

    eprintln!("Merged to: {}", output.display());

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Watermark every page of a PDF
fn cmd_watermark(input: PathBuf, output: PathBuf, text: String, open: bool) -> Result<()> {
    let request = WatermarkRequest::new(read_pdf(&input)?, text)?;

    eprintln!("Adding watermark...");
    let watermarked = LopdfEngine.watermark(request)?;
    write_pdf(&output, &watermarked)?;

    eprintln!("Output: {}", output.display());

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Recompress a PDF
fn cmd_compress(input: PathBuf, output: PathBuf, level: i64) -> Result<()> {
    let file = read_pdf(&input)?;
    let before = file.len();
    let request = CompressRequest::new(file, CompressionLevel::new(level)?);

    let compressed = LopdfEngine.compress(request)?;
    write_pdf(&output, &compressed)?;

    eprintln!(
        "Compressed {} -> {} bytes: {}",
        before,
        compressed.len(),
        output.display()
    );

    Ok(())
}

/// Extract a page range
fn cmd_split(input: PathBuf, output: PathBuf, start: i64, end: i64) -> Result<()> {
    let request = SplitRequest::new(read_pdf(&input)?, PageRange::new(start, end)?);

    let extracted = LopdfEngine.split(request)?;
    write_pdf(&output, &extracted)?;

    eprintln!("Pages {}-{} written to: {}", start, end, output.display());

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> Result<()> {
    let pdf = read_pdf(&input)?;
    let metadata = inspect(pdf.as_bytes())?;

    println!("File: {}", input.display());
    println!("Version: {}", metadata.version);
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(())
}
