//! Download pipeline orchestration.
//!
//! One run takes a view from scroll position zero to a saved document:
//!
//! ```text
//! create sink ─► discover tiles ─► group by page ─► for each page (ascending):
//!                                                     composite ─► append to sink
//!                                                 ─► save
//! ```
//!
//! The sink is created first so a missing encoder fails before any work is
//! done. Pages are composited and appended strictly in page order; only the
//! tile loads inside one page run concurrently. A [`RunGuard`] rejects a
//! second run while one is in flight.

mod error;
mod guard;

pub use error::PipelineError;
pub use guard::{RunGuard, RunPermit};

use crate::assembly::{group_by_page, IncompletePage};
use crate::document::{DocumentError, DocumentFactory, DocumentSink, ImageFormat, PageFormat};
use crate::executor::{BlockingExecutor, ConcurrentRunner, Timer};
use crate::locate::PageLocator;
use crate::naming::{document_filename, DEFAULT_TITLE};
use crate::observer::{DiscoveryConfig, TileObserver};
use crate::progress::{NoOpProgress, ProgressSink};
use crate::raster::{RasterCompositor, RasterConfig};
use crate::view::TileView;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Settings for one pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub discovery: DiscoveryConfig,
    pub raster: RasterConfig,
    pub page_format: PageFormat,
    pub image_format: ImageFormat,
    /// Directory the document is written to
    pub output_dir: PathBuf,
    /// Overrides the view's title candidates
    pub title: Option<String>,
    /// Filename stem when no title is available
    pub default_title: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            raster: RasterConfig::default(),
            page_format: PageFormat::default(),
            image_format: ImageFormat::default(),
            output_dir: PathBuf::from("."),
            title: None,
            default_title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub pages_written: usize,
    pub tiles_discovered: usize,
    /// `ceil(tiles / slots_per_page)`
    pub expected_pages: usize,
    /// Pages dropped for missing slots
    pub dropped_pages: Vec<IncompletePage>,
    pub hint_mismatches: usize,
}

/// Stitches the tiles of a view into a document.
pub struct DownloadPipeline<V, F, X> {
    view: Arc<V>,
    factory: F,
    executor: Arc<X>,
    progress: Arc<dyn ProgressSink>,
    locator: PageLocator,
    config: PipelineConfig,
    guard: RunGuard,
}

impl<V, F, X> DownloadPipeline<V, F, X>
where
    V: TileView,
    F: DocumentFactory,
    X: BlockingExecutor + ConcurrentRunner + Timer,
{
    pub fn new(view: Arc<V>, factory: F, executor: Arc<X>, config: PipelineConfig) -> Self {
        Self {
            view,
            factory,
            executor,
            progress: Arc::new(NoOpProgress),
            locator: PageLocator::default(),
            config,
            guard: RunGuard::new(),
        }
    }

    /// Sets the progress sink.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Replaces the page-hint locator used during discovery.
    pub fn with_locator(mut self, locator: PageLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// True while a run holds the guard.
    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Runs the pipeline once.
    ///
    /// Fails immediately with [`PipelineError::AlreadyRunning`] if another
    /// call on this pipeline has not finished.
    #[instrument(skip(self), fields(output_dir = %self.config.output_dir.display()))]
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Err(PipelineError::AlreadyRunning);
        };

        self.progress.update("Starting download process...", true);
        let result = self.execute().await;
        match &result {
            Ok(report) => {
                info!(
                    path = %report.output_path.display(),
                    pages = report.pages_written,
                    dropped = report.dropped_pages.len(),
                    "Download completed"
                );
                self.progress.update("Download completed successfully!", true);
            }
            Err(e) => {
                error!(error = %e, "Download failed");
                self.progress.update(&format!("Error: {}", e), true);
            }
        }
        self.progress.update("", false);
        result
    }

    async fn execute(&self) -> Result<RunReport, PipelineError> {
        let mut sink = self.factory.create(self.config.page_format)?;

        let slots = self.config.discovery.slots_per_page.max(1);
        let observer = TileObserver::new(
            Arc::clone(&self.view),
            Arc::clone(&self.executor),
            Arc::clone(&self.progress),
            self.config.discovery.clone(),
        )
        .with_locator(self.locator.clone());
        let discovery = observer.discover_tiles().await?;

        let tiles_discovered = discovery.tiles.len();
        let expected_pages = discovery.page_count;
        let assembly = group_by_page(discovery.tiles, slots)?;

        let filename = match &self.config.title {
            Some(title) => document_filename(&[title.as_str()], &self.config.default_title),
            None => document_filename(
                self.view.title_candidates().as_slice(),
                &self.config.default_title,
            ),
        };
        let output_path = self.config.output_dir.join(filename);

        let mut raster = self.config.raster;
        raster.layout.slots = slots;
        let compositor =
            RasterCompositor::new(Arc::clone(&self.view), Arc::clone(&self.executor), raster);

        let total = assembly.pages.len();
        let image_format = self.config.image_format;
        let placement = self.config.page_format.full_page();
        let quality = raster.decoder.quality();

        for (i, page) in assembly.pages.into_iter().enumerate() {
            self.progress
                .update(&format!("Processing page {}/{}...", i + 1, total), true);
            let output = compositor.composite(page).await?;

            sink = self
                .executor
                .execute_blocking(move || {
                    let mut sink = sink;
                    sink.add_page()?;
                    sink.add_image(&output.raster, image_format, placement, quality)?;
                    Ok::<_, DocumentError>(sink)
                })
                .await
                .map_err(|e| PipelineError::Internal(format!("append task failed: {}", e)))??;
        }

        self.progress.update("Saving PDF file...", true);
        let pages_written = sink.page_count();
        let path = output_path.clone();
        self.executor
            .execute_blocking(move || sink.save(&path))
            .await
            .map_err(|e| PipelineError::Internal(format!("save task failed: {}", e)))??;

        Ok(RunReport {
            output_path,
            pages_written,
            tiles_discovered,
            expected_pages,
            dropped_pages: assembly.incomplete,
            hint_mismatches: discovery.hint_mismatches,
        })
    }
}
