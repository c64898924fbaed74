//! Stitch command - rebuild one document from a tile source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgGroup, Args};
use pagestitch::config::ConfigFile;
use pagestitch::document::PdfDocumentFactory;
use pagestitch::executor::TokioExecutor;
use pagestitch::pipeline::{DownloadPipeline, PipelineConfig, RunReport};
use pagestitch::view::{DirectoryView, ManifestView, ReqwestClient, TileView, DEFAULT_REVEAL_WINDOW};
use tracing::info;

use crate::error::CliError;
use crate::progress::ConsoleProgress;
use crate::runner::CliRunner;

/// Arguments for the stitch command.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["dir", "manifest"])))]
pub struct StitchArgs {
    /// Directory of captured tile images (png/jpg), in reading order by filename
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Manifest file listing one tile URL per line
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Directory the PDF is written to (default: output.directory from config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Document title used for the filename
    #[arg(long)]
    pub title: Option<String>,

    /// Tiles stacked on each page
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub slots_per_page: Option<u32>,

    /// Tiles rendered per scroll step when reading a directory (0 renders all)
    #[arg(long)]
    pub window: Option<usize>,

    /// JPEG quality for re-encoded images (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Run the stitch command.
pub fn run(args: StitchArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("stitch");

    let config = resolve_config(runner.config(), &args);
    create_output_dir(&config.output_dir)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let report = runtime.block_on(open_and_stitch(&args, config))?;

    print_report(&report);
    Ok(())
}

/// Config file values with command line overrides applied.
fn resolve_config(file: &ConfigFile, args: &StitchArgs) -> PipelineConfig {
    let mut file = file.clone();
    if let Some(slots) = args.slots_per_page {
        file.layout.slots_per_page = slots as usize;
    }
    if let Some(quality) = args.quality {
        file.decode.jpeg_quality = quality;
    }
    if let Some(dir) = &args.output_dir {
        file.output.directory = dir.clone();
    }

    let mut config = file.pipeline_config();
    config.title = args.title.clone();
    config
}

async fn open_and_stitch(args: &StitchArgs, config: PipelineConfig) -> Result<RunReport, CliError> {
    if let Some(dir) = &args.dir {
        let window = args.window.unwrap_or(DEFAULT_REVEAL_WINDOW);
        let view = DirectoryView::with_window(dir, window)?;
        println!("Reading {} tiles from {}", view.len(), dir.display());
        stitch(view, config).await
    } else if let Some(manifest) = &args.manifest {
        let view = ManifestView::open(manifest, ReqwestClient::new()?)?;
        println!("Fetching {} tiles listed in {}", view.len(), manifest.display());
        stitch(view, config).await
    } else {
        Err(CliError::Config(
            "either --dir or --manifest is required".to_string(),
        ))
    }
}

fn create_output_dir(path: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(path).map_err(|error| CliError::OutputDir {
        path: path.display().to_string(),
        error,
    })
}

async fn stitch<V: TileView>(view: V, config: PipelineConfig) -> Result<RunReport, CliError> {
    let pipeline = DownloadPipeline::new(
        Arc::new(view),
        PdfDocumentFactory,
        Arc::new(TokioExecutor::new()),
        config,
    )
    .with_progress(Arc::new(ConsoleProgress::new()));

    let start = std::time::Instant::now();
    let report = pipeline.run().await?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Stitch finished");
    Ok(report)
}

fn print_report(report: &RunReport) {
    println!();
    println!("✓ Saved {}", report.output_path.display());
    println!(
        "  Pages: {} written of {} expected",
        report.pages_written, report.expected_pages
    );
    println!("  Tiles: {}", report.tiles_discovered);

    if !report.dropped_pages.is_empty() {
        println!("  Skipped incomplete pages:");
        for page in &report.dropped_pages {
            let slots: Vec<String> = page.missing_slots.iter().map(|s| s.to_string()).collect();
            println!(
                "    page {} (missing slots {})",
                page.page_index,
                slots.join(", ")
            );
        }
    }
    if report.hint_mismatches > 0 {
        println!(
            "  {} tile(s) carried a page number that disagreed with their position",
            report.hint_mismatches
        );
    }
}
