//! zpdf CLI - text extraction with the zpdf engine

mod report;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use zpdf::{Document, ExtractMode};

#[derive(Parser)]
#[command(name = "zpdf")]
#[command(version)]
#[command(about = "Extract text from PDFs with the zpdf engine", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page count and page geometry
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the text of a single page
    Page {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page index (zero-based)
        #[arg(value_name = "INDEX")]
        index: usize,
    },

    /// Extract the text of the whole document
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Extraction mode
        #[arg(long, value_enum, env = "ZPDF_MODE", default_value = "parallel")]
        mode: Mode,

        /// Extract page by page with a progress bar
        #[arg(long)]
        per_page: bool,
    },

    /// Print text spans with bounding boxes
    Bounds {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page index (zero-based)
        #[arg(value_name = "INDEX")]
        index: usize,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare parallel and sequential extraction
    Compare {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Let the engine extract pages concurrently
    Parallel,
    /// Extract pages one after another
    Sequential,
}

impl From<Mode> for ExtractMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Parallel => ExtractMode::Parallel,
            Mode::Sequential => ExtractMode::Sequential,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Info { input, json }) => cmd_info(&input, json),
        Some(Commands::Page { input, index }) => cmd_page(&input, index),
        Some(Commands::Text {
            input,
            output,
            mode,
            per_page,
        }) => cmd_text(&input, output.as_deref(), mode.into(), per_page),
        Some(Commands::Bounds { input, index, json }) => cmd_bounds(&input, index, json),
        Some(Commands::Compare { input }) => cmd_compare(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: extract text if input is provided
            if let Some(input) = cli.input {
                cmd_text(
                    &input,
                    cli.output.as_deref(),
                    ExtractMode::default(),
                    false,
                )
            } else {
                println!("{}", "Usage: zpdf <FILE> [OUTPUT]".yellow());
                println!("       zpdf --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::open(input)?;
    let page_count = doc.page_count()?;
    let pages = (0..page_count)
        .map(|i| doc.page_info(i))
        .collect::<zpdf::Result<Vec<_>>>()?;

    if json {
        let info = serde_json::json!({
            "file": input.display().to_string(),
            "page_count": page_count,
            "pages": pages,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), page_count);

    if !pages.is_empty() {
        println!();
        println!("{}", "Page Geometry".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for line in report::page_table(&pages) {
            println!("{}", line);
        }
    }

    Ok(())
}

fn cmd_page(input: &Path, index: usize) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::open(input)?;
    let text = doc.extract_page(index)?;
    println!("{}", text);
    Ok(())
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    mode: ExtractMode,
    per_page: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::open(input)?;

    let text = if per_page {
        let page_count = doc.page_count()?;
        let pb = ProgressBar::new(page_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb.set_message("Extracting pages...");

        let mut text = String::new();
        for page in &doc {
            text.push_str(&page?);
            pb.inc(1);
        }
        pb.finish_with_message("Done!");
        text
    } else {
        log::info!("Extracting {} ({} mode)", input.display(), mode);
        doc.extract_all(mode)?
    };

    if let Some(path) = output {
        fs::write(path, &text)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn cmd_bounds(input: &Path, index: usize, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::open(input)?;
    let spans = doc.extract_bounds(index)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&spans)?);
        return Ok(());
    }

    if spans.is_empty() {
        println!("{}", "No text on this page".yellow());
        return Ok(());
    }

    for line in report::span_lines(&spans) {
        println!("{}", line);
    }
    println!("{}", format!("{} spans", spans.len()).dimmed());

    Ok(())
}

fn cmd_compare(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::open(input)?;
    println!(
        "{}: {} ({} pages)",
        "Document".bold(),
        input.display(),
        doc.page_count()?
    );

    let start = Instant::now();
    let parallel = doc.extract_all(ExtractMode::Parallel)?;
    let parallel_time = start.elapsed();

    let start = Instant::now();
    let sequential = doc.extract_all(ExtractMode::Sequential)?;
    let sequential_time = start.elapsed();

    let comparison = report::Comparison::new(parallel_time, sequential_time);
    println!("{}", comparison);

    if parallel == sequential {
        println!("{}", "Outputs identical".green());
        Ok(())
    } else {
        Err(format!(
            "parallel and sequential outputs differ ({} vs {} bytes)",
            parallel.len(),
            sequential.len()
        )
        .into())
    }
}

fn cmd_version() {
    println!("{} {}", "zpdf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF text extraction powered by the zpdf engine");
}
