//! Manifest-backed view: tile URLs fetched over HTTP.
//!
//! Manifest format, one entry per line:
//!
//! ```text
//! # title: Week 3 - Distributed Systems
//! https://cdn.example.com/chunks/abc/0.png
//! https://cdn.example.com/chunks/abc/1.png
//! ```
//!
//! Blank lines and `#` comments are ignored. The same URL may appear more than
//! once; the observer deduplicates by locator.

use super::{AsyncHttpClient, TileElement, TileView, ViewError};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

const TITLE_DIRECTIVE: &str = "title:";

/// A view over a fixed list of tile URLs.
///
/// A tile counts as loaded once its bytes were fetched and its header decoded.
/// Fetched bytes are kept so the compositor does not download twice.
pub struct ManifestView<C: AsyncHttpClient> {
    client: C,
    urls: Vec<String>,
    title: Option<String>,
    fetched: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

impl<C: AsyncHttpClient> ManifestView<C> {
    /// Reads a manifest file.
    pub fn open(path: impl AsRef<Path>, client: C) -> Result<Self, ViewError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ViewError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, client)
    }

    /// Parses manifest text.
    pub fn parse(text: &str, client: C) -> Result<Self, ViewError> {
        let mut urls = Vec::new();
        let mut title = None;

        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                let comment = comment.trim();
                if let Some(value) = comment.strip_prefix(TITLE_DIRECTIVE) {
                    title = Some(value.trim().to_string());
                }
                continue;
            }
            if !(line.starts_with("http://") || line.starts_with("https://")) {
                return Err(ViewError::InvalidManifest(format!(
                    "line {}: expected an http(s) URL, got '{}'",
                    line_no + 1,
                    line
                )));
            }
            urls.push(line.to_string());
        }

        debug!(entries = urls.len(), title = ?title, "Parsed tile manifest");

        Ok(Self {
            client,
            urls,
            title,
            fetched: Mutex::new(HashMap::new()),
        })
    }

    /// Number of manifest entries (duplicates included).
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// True if the manifest lists no tiles.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    fn cached(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.fetched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
    }

    async fn fetch(&self, url: &str) -> Result<Arc<Vec<u8>>, ViewError> {
        if let Some(bytes) = self.cached(url) {
            return Ok(bytes);
        }
        let bytes = Arc::new(self.client.get(url).await?);
        self.fetched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string(), Arc::clone(&bytes));
        Ok(bytes)
    }
}

fn header_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

impl<C: AsyncHttpClient> TileView for ManifestView<C> {
    async fn scroll_to_top(&self) {}

    async fn enumerate(&self) -> Result<Vec<TileElement>, ViewError> {
        let mut elements = Vec::with_capacity(self.urls.len());
        for url in &self.urls {
            let element = match self.fetch(url).await {
                Ok(bytes) => match header_dimensions(&bytes) {
                    Some((w, h)) => TileElement::loaded(url.clone(), w, h),
                    None => {
                        warn!(url = %url, "Fetched tile is not a decodable image");
                        TileElement::pending(url.clone())
                    }
                },
                Err(e) => {
                    debug!(url = %url, error = %e, "Tile not loaded yet");
                    TileElement::pending(url.clone())
                }
            };
            elements.push(element);
        }
        Ok(elements)
    }

    async fn scroll_into_view(&self, _element: &TileElement) {}

    async fn load(&self, source_key: &str) -> Result<Vec<u8>, ViewError> {
        if !self.urls.iter().any(|u| u == source_key) {
            return Err(ViewError::UnknownTile(source_key.to_string()));
        }
        let bytes = self.fetch(source_key).await?;
        Ok(bytes.as_ref().clone())
    }

    fn title_candidates(&self) -> Vec<String> {
        self.title.iter().cloned().collect()
    }
}
