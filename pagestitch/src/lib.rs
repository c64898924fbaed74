//! Pagestitch - rebuild paged documents from tiled image viewers
//!
//! Online viewers often render each page as a vertical stack of image tiles
//! and only load tiles as they scroll into view. This library drives such a
//! view until every tile has loaded, groups the tiles back into pages,
//! composites each page into one raster and writes the pages to a PDF.
//!
//! # High-Level API
//!
//! The [`pipeline`] module ties the stages together:
//!
//! ```ignore
//! use pagestitch::document::PdfDocumentFactory;
//! use pagestitch::executor::TokioExecutor;
//! use pagestitch::pipeline::{DownloadPipeline, PipelineConfig};
//! use pagestitch::view::DirectoryView;
//!
//! let view = Arc::new(DirectoryView::open("captured/")?);
//! let pipeline = DownloadPipeline::new(
//!     view,
//!     PdfDocumentFactory,
//!     Arc::new(TokioExecutor::new()),
//!     PipelineConfig::default(),
//! );
//! let report = pipeline.run().await?;
//! println!("wrote {} pages to {}", report.pages_written, report.output_path.display());
//! ```

pub mod assembly;
pub mod config;
pub mod document;
pub mod executor;
pub mod locate;
pub mod logging;
pub mod naming;
pub mod observer;
pub mod pipeline;
pub mod progress;
pub mod raster;
pub mod view;

/// Version of the pagestitch library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_not_empty() {
        assert!(!VERSION.is_empty());
    }
}
