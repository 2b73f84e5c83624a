use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use songsplit::classify::VisionBridge;
use songsplit::pipeline::{self, AnalyzeConfig};
use songsplit::quality;
use songsplit::source::{book_id, PdfSource};

#[derive(Parser, Debug)]
#[command(name = "songsplit")]
#[command(version, about = "Resolve songbook PDFs into per-song page ranges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a songbook: scan pages, match the TOC, resolve boundaries
    Analyze {
        /// Input songbook PDF
        input: PathBuf,

        /// TOC entries as JSON: [{"title", "printed_page", "artist"?}]
        #[arg(long)]
        toc: PathBuf,

        /// Saved page classifications (JSON); skips the classifier entirely
        #[arg(long)]
        pages: Option<PathBuf>,

        /// Output directory (default: ./<input_name>_analysis)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rendering DPI for classifier input images
        #[arg(long, default_value_t = 200)]
        dpi: u32,

        /// Parallel classifier calls during the scan
        #[arg(long, default_value_t = 4)]
        jobs: usize,

        /// Stop scanning after this many seconds; remaining pages stay unknown
        #[arg(long)]
        time_budget: Option<u64>,

        /// Path to the vision bridge script
        #[arg(long)]
        bridge: Option<PathBuf>,

        /// Suppress the summary printout
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run quality gates over a saved analysis plus downstream counts
    Gates {
        /// analysis.json produced by `analyze`
        #[arg(long)]
        report: PathBuf,

        /// Songs that passed downstream verification
        #[arg(long, default_value_t = 0)]
        verified: usize,

        /// Songs extracted to output files
        #[arg(long, default_value_t = 0)]
        extracted: usize,

        /// Total songs handed to the downstream splitter
        #[arg(long, default_value_t = 0)]
        total: usize,

        /// Accept books with fewer TOC entries than the threshold
        #[arg(long)]
        allow_short_books: bool,
    },

    /// Show information about a songbook PDF
    Info {
        /// Input songbook PDF
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            input,
            toc,
            pages,
            output,
            dpi,
            jobs,
            time_budget,
            bridge,
            quiet,
        } => analyze(input, toc, pages, output, dpi, jobs, time_budget, bridge, quiet),
        Commands::Gates {
            report,
            verified,
            extracted,
            total,
            allow_short_books,
        } => gates(report, verified, extracted, total, allow_short_books),
        Commands::Info { input } => info(input),
    }
}

#[allow(clippy::too_many_arguments)]
fn analyze(
    input: PathBuf,
    toc_path: PathBuf,
    pages: Option<PathBuf>,
    output: Option<PathBuf>,
    dpi: u32,
    jobs: usize,
    time_budget: Option<u64>,
    bridge: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let toc = pipeline::load_toc(&toc_path)?;

    let output_dir = output.unwrap_or_else(|| {
        let stem = book_id(&input);
        PathBuf::from(format!("{stem}_analysis"))
    });

    let analysis = match pages {
        Some(pages_path) => {
            let pages = pipeline::load_pages(&pages_path)?;
            let total_pages = pages.iter().map(|p| p.pdf_page).max().unwrap_or(0);
            pipeline::resolve_offline(&book_id(&input), total_pages, &toc, pages)
        }
        None => {
            let mut config = AnalyzeConfig::new(input.clone(), output_dir.clone());
            config.dpi = dpi;
            config.jobs = jobs;
            config.time_budget = time_budget.map(Duration::from_secs);

            let mut classifier = VisionBridge::new();
            if let Some(script) = bridge {
                classifier = classifier.with_script(script);
            }
            pipeline::analyze_document(&config, &toc, &classifier)
                .with_context(|| format!("failed to analyze: {}", input.display()))?
        }
    };

    pipeline::export_analysis(&analysis, &output_dir)
        .with_context(|| format!("failed to export to: {}", output_dir.display()))?;

    if !quiet {
        println!(
            "[✓] {}: {} songs across {} pages (offset {:+}, confidence {:.2})",
            analysis.book_id,
            analysis.songs.len(),
            analysis.total_pages,
            analysis.calculated_offset,
            analysis.offset_confidence,
        );
        for warning in &analysis.warnings {
            println!("[!] {warning}");
        }
        println!("[*] Results saved to: {}", output_dir.display());
    }

    Ok(())
}

fn gates(
    report: PathBuf,
    verified: usize,
    extracted: usize,
    total: usize,
    allow_short_books: bool,
) -> Result<()> {
    let data = std::fs::read_to_string(&report)
        .with_context(|| format!("failed to read report: {}", report.display()))?;
    let analysis: songsplit::AnalysisResult = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse report: {}", report.display()))?;

    let results = quality::aggregate(vec![
        quality::check_toc_completeness(analysis.toc_song_count, allow_short_books),
        quality::check_verification_rate(verified, total),
        quality::check_output_rate(extracted, total),
    ]);

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn info(input: PathBuf) -> Result<()> {
    let source = PdfSource::new(input.clone(), std::env::temp_dir(), 200)
        .with_context(|| format!("failed to open PDF: {}", input.display()))?;
    let page_count = source.page_count()?;

    println!("Songbook Information");
    println!("====================");
    println!("File: {}", input.display());
    println!("Pages: {page_count}");

    Ok(())
}
