//! Raster compositing.
//!
//! Turns a [`CompletePage`] into an [`OutputPage`]:
//!
//! 1. Load every tile of the page concurrently through the view, each load
//!    bounded by a timeout
//! 2. Resequence the loaded bytes by slot (loads complete in any order)
//! 3. Decode, re-encode and composite on the blocking executor
//!
//! Any tile that cannot be loaded or decoded fails the page. There is no
//! placeholder substitution: a page with a missing band is wrong, not degraded.

mod composite;
mod decode;

pub use composite::{composite_page, OutputPage, PageLayout, DEFAULT_PAGE_HEIGHT_PX, DEFAULT_PAGE_WIDTH_PX};
pub use decode::{DecodedTile, TileDecoder, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_TILE_DIMENSION};

use crate::assembly::CompletePage;
use crate::executor::{BlockingExecutor, ConcurrentRunner, ExecutorError, Timer};
use crate::view::{TileView, ViewError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Default time a single tile may take to load.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Compositing failures.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// Tile bytes could not be obtained in time or could not be decoded
    #[error("tile {source_key} could not be decoded: {reason}")]
    TileDecode { source_key: String, reason: String },

    /// The view failed to hand out the tile's bytes
    #[error("tile {source_key} could not be loaded: {source}")]
    Load {
        source_key: String,
        #[source]
        source: ViewError,
    },

    /// Executor or bookkeeping failure
    #[error("internal compositor error: {0}")]
    Internal(String),
}

impl CompositeError {
    /// Key of the tile that failed, if the failure concerns a single tile.
    pub fn source_key(&self) -> Option<&str> {
        match self {
            CompositeError::TileDecode { source_key, .. }
            | CompositeError::Load { source_key, .. } => Some(source_key),
            CompositeError::Internal(_) => None,
        }
    }
}

/// Compositor settings.
#[derive(Debug, Clone, Copy)]
pub struct RasterConfig {
    pub layout: PageLayout,
    pub decoder: TileDecoder,
    pub load_timeout: Duration,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            layout: PageLayout::default(),
            decoder: TileDecoder::default(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }
}

/// Loads, decodes and composites complete pages.
pub struct RasterCompositor<V, X> {
    view: Arc<V>,
    executor: Arc<X>,
    config: RasterConfig,
}

impl<V, X> RasterCompositor<V, X>
where
    V: TileView,
    X: BlockingExecutor + ConcurrentRunner + Timer,
{
    pub fn new(view: Arc<V>, executor: Arc<X>, config: RasterConfig) -> Self {
        Self {
            view,
            executor,
            config,
        }
    }

    pub fn layout(&self) -> PageLayout {
        self.config.layout
    }

    /// Composites one page. Resolves only after all of its tiles decoded.
    #[instrument(skip(self, page), fields(page = page.page_index))]
    pub async fn composite(&self, page: CompletePage) -> Result<OutputPage, CompositeError> {
        let page_index = page.page_index;
        let bytes = self.load_tiles(&page).await?;

        let decoder = self.config.decoder;
        let layout = self.config.layout;
        let keys: Vec<String> = page.tiles.into_iter().map(|t| t.source_key).collect();

        let output = self
            .executor
            .execute_blocking(move || {
                let decoded = keys
                    .iter()
                    .zip(bytes.iter())
                    .map(|(key, data)| decoder.decode(key, data))
                    .collect::<Result<Vec<_>, _>>()?;
                composite_page(page_index, &decoded, layout)
            })
            .await
            .map_err(|e| CompositeError::Internal(format!("composite task failed: {}", e)))??;

        debug!(page = page_index, "Page composited");
        Ok(output)
    }

    /// Loads all tile bytes of a page, returned in slot order.
    async fn load_tiles(&self, page: &CompletePage) -> Result<Vec<Vec<u8>>, CompositeError> {
        let timeout = self.config.load_timeout;
        let loads: Vec<_> = page
            .tiles
            .iter()
            .enumerate()
            .map(|(slot, tile)| {
                let view = Arc::clone(&self.view);
                let executor = Arc::clone(&self.executor);
                let key = tile.source_key.clone();
                async move {
                    let load_key = key.clone();
                    let result = executor
                        .timeout(timeout, async move { view.load(&load_key).await })
                        .await;
                    (slot, key, result)
                }
            })
            .collect();

        let mut slots: Vec<Option<Vec<u8>>> = vec![None; page.tiles.len()];
        for joined in self.executor.run_concurrent(loads).await {
            let (slot, key, result) = joined
                .map_err(|e| CompositeError::Internal(format!("tile load task failed: {}", e)))?;
            let data = match result {
                Ok(Ok(data)) => data,
                Ok(Err(source)) => {
                    return Err(CompositeError::Load {
                        source_key: key,
                        source,
                    })
                }
                Err(ExecutorError::Timeout) => {
                    return Err(CompositeError::TileDecode {
                        source_key: key,
                        reason: format!("not loadable within {:?}", timeout),
                    })
                }
                Err(e) => return Err(CompositeError::Internal(e.to_string())),
            };
            if let Some(entry) = slots.get_mut(slot) {
                *entry = Some(data);
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(slot, data)| {
                data.ok_or_else(|| {
                    CompositeError::Internal(format!("slot {} produced no data", slot))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{SyncExecutor, TokioExecutor};
    use crate::locate::positional;
    use crate::observer::Tile;
    use crate::view::TileElement;
    use image::{Rgb, RgbImage};
    use std::collections::HashMap;
    use std::io::Cursor;

    /// View serving fixed bytes per key; `stall` keys never resolve.
    #[derive(Default)]
    struct BytesView {
        tiles: HashMap<String, Vec<u8>>,
        stall: Vec<String>,
    }

    impl TileView for BytesView {
        async fn scroll_to_top(&self) {}

        async fn enumerate(&self) -> Result<Vec<TileElement>, ViewError> {
            Ok(Vec::new())
        }

        async fn scroll_into_view(&self, _element: &TileElement) {}

        async fn load(&self, source_key: &str) -> Result<Vec<u8>, ViewError> {
            if self.stall.iter().any(|k| k == source_key) {
                std::future::pending::<()>().await;
            }
            self.tiles
                .get(source_key)
                .cloned()
                .ok_or_else(|| ViewError::UnknownTile(source_key.to_string()))
        }

        fn title_candidates(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn png(color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(24, 6, Rgb(color));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn page(page_index: u32, slots: usize) -> CompletePage {
        let first = (page_index as usize - 1) * slots;
        CompletePage {
            page_index,
            tiles: (first..first + slots)
                .map(|order| {
                    let (page_index, slot_index) = positional(order, slots);
                    Tile {
                        source_key: format!("tile-{}", order),
                        discovery_order: order,
                        page_index,
                        slot_index,
                        pixel_width: 24,
                        pixel_height: 6,
                        page_hint: None,
                    }
                })
                .collect(),
        }
    }

    fn config(slots: usize) -> RasterConfig {
        RasterConfig {
            layout: PageLayout {
                width_px: 48,
                height_px: 12 * slots as u32,
                slots,
            },
            ..RasterConfig::default()
        }
    }

    fn shade(slot: usize) -> [u8; 3] {
        let v = (slot * 40 + 20) as u8;
        [v, 255 - v, v / 2]
    }

    #[test]
    fn test_resequences_reversed_loads() {
        // SyncExecutor completes loads in reverse order.
        let mut view = BytesView::default();
        for order in 0..4 {
            view.tiles
                .insert(format!("tile-{}", order), png(shade(order)));
        }
        let compositor = RasterCompositor::new(
            Arc::new(view),
            Arc::new(SyncExecutor::default()),
            config(4),
        );

        let output = futures::executor::block_on(compositor.composite(page(1, 4))).unwrap();

        for slot in 0..4 {
            let (top, height) = compositor.layout().band(slot);
            let pixel = output.raster.get_pixel(24, top + height / 2).0;
            let expected = shade(slot);
            assert!(
                pixel.iter().zip(expected.iter()).all(|(a, b)| a.abs_diff(*b) <= 24),
                "slot {}: {:?} vs {:?}",
                slot,
                pixel,
                expected
            );
        }
    }

    #[test]
    fn test_missing_tile_is_load_error() {
        let mut view = BytesView::default();
        view.tiles.insert("tile-0".to_string(), png([0, 0, 0]));
        let compositor =
            RasterCompositor::new(Arc::new(view), Arc::new(SyncExecutor::default()), config(2));

        let result = futures::executor::block_on(compositor.composite(page(1, 2)));

        match result {
            Err(e @ CompositeError::Load { .. }) => assert_eq!(e.source_key(), Some("tile-1")),
            other => panic!("expected load error, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_tile_is_decode_error() {
        let mut view = BytesView::default();
        view.tiles.insert("tile-2".to_string(), png([0, 0, 0]));
        view.tiles.insert("tile-3".to_string(), b"garbage".to_vec());
        let compositor =
            RasterCompositor::new(Arc::new(view), Arc::new(SyncExecutor::default()), config(2));

        let result = futures::executor::block_on(compositor.composite(page(2, 2)));

        assert!(matches!(
            result,
            Err(CompositeError::TileDecode { ref source_key, .. }) if source_key == "tile-3"
        ));
    }

    #[tokio::test]
    async fn test_stalled_tile_times_out() {
        let mut view = BytesView::default();
        view.tiles.insert("tile-0".to_string(), png([0, 0, 0]));
        view.tiles.insert("tile-1".to_string(), png([0, 0, 0]));
        view.stall.push("tile-1".to_string());
        let mut cfg = config(2);
        cfg.load_timeout = Duration::from_millis(20);
        let compositor = RasterCompositor::new(Arc::new(view), Arc::new(TokioExecutor::new()), cfg);

        let result = compositor.composite(page(1, 2)).await;

        match result {
            Err(CompositeError::TileDecode { source_key, reason }) => {
                assert_eq!(source_key, "tile-1");
                assert!(reason.contains("not loadable"));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tokio_executor_composites_page() {
        let mut view = BytesView::default();
        for order in 0..6 {
            view.tiles.insert(format!("tile-{}", order), png(shade(order)));
        }
        let compositor =
            RasterCompositor::new(Arc::new(view), Arc::new(TokioExecutor::new()), config(6));

        let output = compositor.composite(page(1, 6)).await.unwrap();

        assert_eq!(output.page_index, 1);
        assert_eq!(output.raster.dimensions(), (48, 72));
    }
}
