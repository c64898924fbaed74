//! Tile discovery.
//!
//! The observer polls a [`TileView`] until no new tiles appear for several
//! consecutive polls. Each poll inserts every fully loaded, not yet seen tile
//! into a [`TileSet`] and scrolls the last element into view so the viewer
//! renders more.
//!
//! ```text
//! scroll to top ─► settle ─► ┌─ sleep(poll) ─► enumerate ─► insert new ─► scroll last ─┐
//!                            └───────────── count unchanged < threshold ◄──────────────┘
//! ```

mod stability;
mod tile;

pub use stability::{PollOutcome, StabilityTracker};
pub use tile::{Tile, TileSet};

use crate::executor::Timer;
use crate::locate::PageLocator;
use crate::progress::ProgressSink;
use crate::view::{TileView, ViewError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, trace, warn};

/// Default delay after scrolling to the top before the first poll.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);
/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
/// Default number of unchanged polls that ends discovery.
pub const DEFAULT_STABLE_POLLS: u32 = 3;
/// Default overall discovery budget.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);
/// Default number of tiles stacked on one page.
pub const DEFAULT_SLOTS_PER_PAGE: usize = 6;

/// Discovery tuning.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub settle_delay: Duration,
    pub poll_interval: Duration,
    pub stable_polls: u32,
    /// Budget of scheduled waiting (settle plus poll intervals).
    ///
    /// Time spent inside `enumerate` is not added to it, but each enumeration
    /// is cut off once it outlasts the remaining budget (never less than one
    /// poll interval), so a stalled view still ends in a timeout.
    pub max_wait: Duration,
    pub slots_per_page: usize,
    /// Warn when a locator page hint disagrees with the positional page
    pub verify_page_hints: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stable_polls: DEFAULT_STABLE_POLLS,
            max_wait: DEFAULT_MAX_WAIT,
            slots_per_page: DEFAULT_SLOTS_PER_PAGE,
            verify_page_hints: false,
        }
    }
}

/// What discovery found.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// `ceil(tiles / slots_per_page)`
    pub page_count: usize,
    /// Unique tiles in discovery order
    pub tiles: Vec<Tile>,
    /// Tiles whose page hint disagreed with their positional page
    pub hint_mismatches: usize,
    /// Number of polls performed
    pub polls: u32,
}

/// Discovery failures.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The tile count kept changing past the wait budget
    #[error("tile count did not stabilize within {waited:?} ({tiles} tiles seen)")]
    Timeout { waited: Duration, tiles: usize },

    /// The view could not be enumerated
    #[error("view enumeration failed: {0}")]
    View(#[from] ViewError),
}

/// Polls a view until tile discovery stabilizes.
pub struct TileObserver<V, T> {
    view: Arc<V>,
    timer: Arc<T>,
    progress: Arc<dyn ProgressSink>,
    locator: PageLocator,
    config: DiscoveryConfig,
}

impl<V, T> TileObserver<V, T>
where
    V: TileView,
    T: Timer,
{
    pub fn new(
        view: Arc<V>,
        timer: Arc<T>,
        progress: Arc<dyn ProgressSink>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            view,
            timer,
            progress,
            locator: PageLocator::default(),
            config,
        }
    }

    /// Replaces the page-hint locator.
    pub fn with_locator(mut self, locator: PageLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Runs discovery to completion.
    ///
    /// An empty view is not an error here: it yields `page_count == 0` and the
    /// caller decides whether that is fatal.
    #[instrument(skip(self), fields(slots = self.config.slots_per_page))]
    pub async fn discover_tiles(&self) -> Result<Discovery, DiscoveryError> {
        self.progress.update("Detecting document structure...", true);

        self.view.scroll_to_top().await;
        self.timer.sleep(self.config.settle_delay).await;
        let mut waited = self.config.settle_delay;

        let mut set = TileSet::new(self.config.slots_per_page);
        let mut tracker = StabilityTracker::new(self.config.stable_polls);
        let mut hint_mismatches = 0;
        let mut polls = 0u32;

        loop {
            self.timer.sleep(self.config.poll_interval).await;
            waited += self.config.poll_interval;
            polls += 1;

            let limit = self
                .config
                .max_wait
                .saturating_sub(waited)
                .max(self.config.poll_interval);
            let view = Arc::clone(&self.view);
            let elements = match self
                .timer
                .timeout(limit, async move { view.enumerate().await })
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    warn!(?limit, tiles = set.len(), "View enumeration stalled");
                    return Err(DiscoveryError::Timeout {
                        waited: waited + limit,
                        tiles: set.len(),
                    });
                }
            };
            for element in elements.iter().filter(|e| e.is_fully_loaded()) {
                if set.contains(&element.source_key) {
                    continue;
                }
                let hint = self.locator.page_hint(element);
                let Some(tile) = set.insert(
                    &element.source_key,
                    element.natural_width,
                    element.natural_height,
                    hint,
                ) else {
                    continue;
                };
                if self.config.verify_page_hints && hint.is_some_and(|h| h != tile.page_index) {
                    warn!(
                        source_key = %tile.source_key,
                        positional_page = tile.page_index,
                        hinted_page = ?hint,
                        "Page hint disagrees with positional page"
                    );
                    hint_mismatches += 1;
                }
            }

            if let Some(last) = elements.last() {
                self.view.scroll_into_view(last).await;
            }

            match tracker.record(set.len()) {
                PollOutcome::Progressed { count } => {
                    debug!(poll = polls, count, "Tile count grew");
                    self.progress
                        .update(&format!("Found {} image chunks...", count), true);
                }
                PollOutcome::Unchanged { stable_polls } => {
                    trace!(poll = polls, stable_polls, "Tile count unchanged");
                }
                PollOutcome::Stable { count } => {
                    debug!(poll = polls, count, "Tile discovery stabilized");
                    break;
                }
            }

            if waited >= self.config.max_wait {
                warn!(?waited, tiles = set.len(), "Tile discovery timed out");
                return Err(DiscoveryError::Timeout {
                    waited,
                    tiles: set.len(),
                });
            }
        }

        let page_count = set.page_count();
        info!(
            tiles = set.len(),
            page_count, polls, hint_mismatches, "Tile discovery complete"
        );
        self.progress.update(
            &format!("Found {} unique images in {} pages", set.len(), page_count),
            true,
        );

        Ok(Discovery {
            page_count,
            tiles: set.into_tiles(),
            hint_mismatches,
            polls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SyncExecutor;
    use crate::progress::RecordingProgress;
    use crate::view::TileElement;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// View that replays one scripted enumeration per poll, then repeats the last.
    struct ScriptedView {
        polls: Vec<Vec<TileElement>>,
        cursor: AtomicUsize,
        scrolled: Mutex<Vec<String>>,
    }

    impl ScriptedView {
        fn new(polls: Vec<Vec<TileElement>>) -> Self {
            Self {
                polls,
                cursor: AtomicUsize::new(0),
                scrolled: Mutex::new(Vec::new()),
            }
        }

        /// Polls whose loaded tile counts follow `counts`.
        fn with_counts(counts: &[usize]) -> Self {
            Self::new(
                counts
                    .iter()
                    .map(|&n| {
                        (0..n)
                            .map(|i| TileElement::loaded(format!("tile-{}", i), 100, 20))
                            .collect()
                    })
                    .collect(),
            )
        }
    }

    impl TileView for ScriptedView {
        async fn scroll_to_top(&self) {}

        async fn enumerate(&self) -> Result<Vec<TileElement>, ViewError> {
            let i = self.cursor.fetch_add(1, Ordering::SeqCst);
            let i = i.min(self.polls.len().saturating_sub(1));
            Ok(self.polls.get(i).cloned().unwrap_or_default())
        }

        async fn scroll_into_view(&self, element: &TileElement) {
            self.scrolled
                .lock()
                .unwrap()
                .push(element.source_key.clone());
        }

        async fn load(&self, source_key: &str) -> Result<Vec<u8>, ViewError> {
            Err(ViewError::UnknownTile(source_key.to_string()))
        }

        fn title_candidates(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn observer(
        view: ScriptedView,
        config: DiscoveryConfig,
    ) -> (
        TileObserver<ScriptedView, SyncExecutor>,
        Arc<ScriptedView>,
        Arc<SyncExecutor>,
        Arc<RecordingProgress>,
    ) {
        let view = Arc::new(view);
        let timer = Arc::new(SyncExecutor::default());
        let progress = Arc::new(RecordingProgress::new());
        let observer = TileObserver::new(
            Arc::clone(&view),
            Arc::clone(&timer),
            progress.clone(),
            config,
        );
        (observer, view, timer, progress)
    }

    #[test]
    fn test_stabilizes_after_three_repeats() {
        let (observer, view, _, _) = observer(
            ScriptedView::with_counts(&[0, 3, 6, 6, 6, 6]),
            DiscoveryConfig::default(),
        );

        let discovery = futures::executor::block_on(observer.discover_tiles()).unwrap();

        assert_eq!(discovery.polls, 6);
        assert_eq!(discovery.tiles.len(), 6);
        assert_eq!(discovery.page_count, 1);
        assert_eq!(view.cursor.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_deduplicates_across_polls() {
        let a = TileElement::loaded("https://cdn/a.png", 10, 10);
        let b = TileElement::loaded("https://cdn/b.png", 10, 10);
        let c = TileElement::loaded("https://cdn/c.png", 10, 10);
        let (observer, _, _, _) = observer(
            ScriptedView::new(vec![
                vec![a.clone(), b.clone()],
                // Viewer recycled its elements; c now renders first.
                vec![c.clone(), a.clone(), b.clone()],
                vec![a.clone(), a.clone(), c.clone(), b.clone()],
            ]),
            DiscoveryConfig::default(),
        );

        let discovery = futures::executor::block_on(observer.discover_tiles()).unwrap();

        let keys: Vec<_> = discovery.tiles.iter().map(|t| t.source_key.as_str()).collect();
        assert_eq!(keys, vec!["https://cdn/a.png", "https://cdn/b.png", "https://cdn/c.png"]);
        assert_eq!(discovery.tiles[2].discovery_order, 2);
    }

    #[test]
    fn test_skips_tiles_not_yet_loaded() {
        let (observer, _, _, _) = observer(
            ScriptedView::new(vec![
                vec![
                    TileElement::loaded("a", 10, 10),
                    TileElement::pending("b"),
                    TileElement::loaded("c", 0, 10),
                ],
                vec![
                    TileElement::loaded("a", 10, 10),
                    TileElement::loaded("b", 10, 10),
                    TileElement::loaded("c", 10, 10),
                ],
            ]),
            DiscoveryConfig::default(),
        );

        let discovery = futures::executor::block_on(observer.discover_tiles()).unwrap();

        let keys: Vec<_> = discovery.tiles.iter().map(|t| t.source_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_view_returns_zero_pages() {
        let (observer, _, _, _) =
            observer(ScriptedView::with_counts(&[0]), DiscoveryConfig::default());

        let discovery = futures::executor::block_on(observer.discover_tiles()).unwrap();

        assert_eq!(discovery.page_count, 0);
        assert!(discovery.tiles.is_empty());
    }

    #[test]
    fn test_scrolls_last_element_into_view() {
        let (observer, view, _, _) = observer(
            ScriptedView::with_counts(&[2, 4]),
            DiscoveryConfig::default(),
        );

        futures::executor::block_on(observer.discover_tiles()).unwrap();

        let scrolled = view.scrolled.lock().unwrap();
        assert_eq!(scrolled[0], "tile-1");
        assert_eq!(scrolled[1], "tile-3");
    }

    #[test]
    fn test_times_out_when_count_keeps_growing() {
        let counts: Vec<usize> = (1..=50).collect();
        let config = DiscoveryConfig {
            max_wait: Duration::from_secs(10),
            ..DiscoveryConfig::default()
        };
        let (observer, _, timer, _) = observer(ScriptedView::with_counts(&counts), config);

        let result = futures::executor::block_on(observer.discover_tiles());

        match result {
            Err(DiscoveryError::Timeout { waited, tiles }) => {
                assert!(waited >= Duration::from_secs(10));
                assert_eq!(tiles, 4);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(timer.total_slept(), Duration::from_secs(10));
    }

    /// Enumeration never completes.
    struct StalledView;

    impl TileView for StalledView {
        async fn scroll_to_top(&self) {}

        async fn enumerate(&self) -> Result<Vec<TileElement>, ViewError> {
            std::future::pending().await
        }

        async fn scroll_into_view(&self, _element: &TileElement) {}

        async fn load(&self, source_key: &str) -> Result<Vec<u8>, ViewError> {
            Err(ViewError::UnknownTile(source_key.to_string()))
        }

        fn title_candidates(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_stalled_enumeration_counts_against_budget() {
        let config = DiscoveryConfig {
            settle_delay: Duration::from_millis(1),
            poll_interval: Duration::from_millis(1),
            max_wait: Duration::from_millis(30),
            ..DiscoveryConfig::default()
        };
        let observer = TileObserver::new(
            Arc::new(StalledView),
            Arc::new(crate::executor::TokioExecutor::new()),
            Arc::new(RecordingProgress::new()),
            config,
        );

        let result = observer.discover_tiles().await;

        match result {
            Err(DiscoveryError::Timeout { waited, tiles }) => {
                assert_eq!(tiles, 0);
                assert_eq!(waited, Duration::from_millis(30));
            }
            other => panic!("expected timeout, got {:?}", other.map(|d| d.polls)),
        }
    }

    #[test]
    fn test_waits_settle_then_poll_interval() {
        let config = DiscoveryConfig {
            settle_delay: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            stable_polls: 1,
            ..DiscoveryConfig::default()
        };
        let (observer, _, timer, _) = observer(ScriptedView::with_counts(&[0]), config);

        futures::executor::block_on(observer.discover_tiles()).unwrap();

        let slept = timer.slept.lock().unwrap().clone();
        assert_eq!(
            slept,
            vec![Duration::from_millis(500), Duration::from_millis(100)]
        );
    }

    #[test]
    fn test_progress_messages() {
        let (observer, _, _, progress) = observer(
            ScriptedView::with_counts(&[6, 12]),
            DiscoveryConfig::default(),
        );

        futures::executor::block_on(observer.discover_tiles()).unwrap();

        let messages = progress.messages();
        assert_eq!(messages[0], "Detecting document structure...");
        assert!(messages.contains(&"Found 6 image chunks...".to_string()));
        assert!(messages.contains(&"Found 12 image chunks...".to_string()));
        assert_eq!(
            messages.last().unwrap(),
            "Found 12 unique images in 2 pages"
        );
    }

    #[test]
    fn test_counts_hint_mismatches_when_verifying() {
        // Second tile claims page 5 through its URL; positionally it is page 1.
        let view = ScriptedView::new(vec![vec![
            TileElement::loaded("https://cdn/x/tile?page=1", 10, 10),
            TileElement::loaded("https://cdn/x/tile?page=5", 10, 10),
        ]]);
        let config = DiscoveryConfig {
            verify_page_hints: true,
            ..DiscoveryConfig::default()
        };
        let (observer, _, _, _) = observer(view, config);

        let discovery = futures::executor::block_on(observer.discover_tiles()).unwrap();

        assert_eq!(discovery.hint_mismatches, 1);
        assert_eq!(discovery.tiles[1].page_hint, Some(5));
        assert_eq!(discovery.tiles[1].page_index, 1);
    }
}
