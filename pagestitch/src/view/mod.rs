//! View sources: where tile elements come from.
//!
//! A [`TileView`] is the live viewer the observer polls. It enumerates the tile
//! elements currently rendered, reports whether each one has finished loading,
//! and hands out the raw image bytes for a tile once the compositor asks for them.
//!
//! Two sources ship with the crate:
//!
//! - [`DirectoryView`] - tiles captured to a local directory, with a reveal
//!   window that mimics a viewer that renders lazily while scrolling
//! - [`ManifestView`] - a list of tile URLs fetched over HTTP

mod directory;
mod http;
mod manifest;

pub use directory::{DirectoryView, DEFAULT_REVEAL_WINDOW};
pub use http::{AsyncHttpClient, ReqwestClient};
pub use manifest::ManifestView;

use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

/// One tile element as currently rendered by the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileElement {
    /// Resolved resource locator, unique per tile.
    pub source_key: String,
    /// True once the underlying image finished loading.
    pub loaded: bool,
    /// Natural width in pixels (0 until loaded)
    pub natural_width: u32,
    /// Natural height in pixels (0 until loaded)
    pub natural_height: u32,
    /// Extra element attributes (e.g. `data-page`).
    pub attributes: BTreeMap<String, String>,
}

impl TileElement {
    /// Creates an element that has not finished loading yet.
    pub fn pending(source_key: impl Into<String>) -> Self {
        Self {
            source_key: source_key.into(),
            loaded: false,
            natural_width: 0,
            natural_height: 0,
            attributes: BTreeMap::new(),
        }
    }

    /// Creates a fully loaded element with known dimensions.
    pub fn loaded(source_key: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            source_key: source_key.into(),
            loaded: true,
            natural_width: width,
            natural_height: height,
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute (builder style).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Loaded flag set and both natural dimensions positive.
    pub fn is_fully_loaded(&self) -> bool {
        self.loaded && self.natural_width > 0 && self.natural_height > 0
    }
}

/// Errors raised by view sources.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Filesystem access failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request failed
    #[error("HTTP error for {url}: {message}")]
    Http { url: String, message: String },

    /// Manifest could not be parsed
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// The view has no tile with this key
    #[error("unknown tile: {0}")]
    UnknownTile(String),
}

/// The live view being observed.
///
/// All methods take `&self`; implementations use interior mutability for
/// scroll state so a view can be shared behind an `Arc` between the observer
/// and concurrent tile loads.
pub trait TileView: Send + Sync + 'static {
    /// Resets the scroll position to the top of the view.
    fn scroll_to_top(&self) -> impl Future<Output = ()> + Send;

    /// Enumerates the tile elements currently present, in view order.
    fn enumerate(&self) -> impl Future<Output = Result<Vec<TileElement>, ViewError>> + Send;

    /// Scrolls the given element into view, which may render more tiles.
    fn scroll_into_view(&self, element: &TileElement) -> impl Future<Output = ()> + Send;

    /// Returns the encoded image bytes for a tile, waiting for it to load.
    fn load(&self, source_key: &str) -> impl Future<Output = Result<Vec<u8>, ViewError>> + Send;

    /// Title sources in priority order (document title, heading, page title).
    fn title_candidates(&self) -> Vec<String>;
}
