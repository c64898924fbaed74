//! Directory-backed view of captured tile images.

use super::{TileElement, TileView, ViewError};
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, trace};

/// Number of tiles a freshly opened directory view renders before scrolling.
pub const DEFAULT_REVEAL_WINDOW: usize = 12;

const TILE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// A directory of tile images presented as a lazily rendering viewer.
///
/// Files are ordered by natural filename order (`chunk2` before `chunk10`).
/// Only the first `window` tiles are enumerable at first; scrolling the last
/// visible tile into view renders the next `window`.
pub struct DirectoryView {
    root: PathBuf,
    files: Vec<PathBuf>,
    window: usize,
    revealed: AtomicUsize,
    dimensions: Mutex<HashMap<PathBuf, (u32, u32)>>,
}

impl DirectoryView {
    /// Opens a directory with the default reveal window.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ViewError> {
        Self::with_window(root, DEFAULT_REVEAL_WINDOW)
    }

    /// Opens a directory, rendering `window` tiles per scroll step.
    ///
    /// A window of 0 renders everything up front.
    pub fn with_window(root: impl AsRef<Path>, window: usize) -> Result<Self, ViewError> {
        let root = root.as_ref().to_path_buf();
        let entries = std::fs::read_dir(&root).map_err(|source| ViewError::Io {
            path: root.display().to_string(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ViewError::Io {
                path: root.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && has_tile_extension(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| compare_natural(file_name(a), file_name(b)));

        let window = if window == 0 { files.len() } else { window };
        let revealed = window.min(files.len());

        debug!(
            root = %root.display(),
            tiles = files.len(),
            window,
            "Opened tile directory"
        );

        Ok(Self {
            root,
            files,
            window,
            revealed: AtomicUsize::new(revealed),
            dimensions: Mutex::new(HashMap::new()),
        })
    }

    /// Total number of tile files in the directory.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if the directory holds no tile files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of tiles currently rendered.
    pub fn revealed(&self) -> usize {
        self.revealed.load(Ordering::SeqCst)
    }

    fn element_for(&self, path: &Path) -> TileElement {
        let key = path.to_string_lossy().into_owned();
        let dims = {
            // Only readable headers are cached; a file still being written
            // is read again on the next poll.
            let mut cache = self.dimensions.lock().unwrap_or_else(|e| e.into_inner());
            match cache.get(path) {
                Some(&dims) => Some(dims),
                None => {
                    let read = image::image_dimensions(path).ok();
                    if let Some(dims) = read {
                        cache.insert(path.to_path_buf(), dims);
                    }
                    read
                }
            }
        };
        match dims {
            Some((w, h)) => TileElement::loaded(key, w, h),
            None => {
                trace!(path = %path.display(), "Tile header unreadable, reporting as not loaded");
                TileElement::pending(key)
            }
        }
    }

    fn position_of(&self, source_key: &str) -> Option<usize> {
        self.files
            .iter()
            .position(|p| p.to_string_lossy() == source_key)
    }
}

impl TileView for DirectoryView {
    async fn scroll_to_top(&self) {
        // Rendered tiles stay rendered; only the scroll position moves.
    }

    async fn enumerate(&self) -> Result<Vec<TileElement>, ViewError> {
        let visible = self.revealed();
        Ok(self.files[..visible]
            .iter()
            .map(|p| self.element_for(p))
            .collect())
    }

    async fn scroll_into_view(&self, element: &TileElement) {
        if let Some(index) = self.position_of(&element.source_key) {
            let target = (index + 1 + self.window).min(self.files.len());
            self.revealed.fetch_max(target, Ordering::SeqCst);
        }
    }

    async fn load(&self, source_key: &str) -> Result<Vec<u8>, ViewError> {
        let index = self
            .position_of(source_key)
            .ok_or_else(|| ViewError::UnknownTile(source_key.to_string()))?;
        let path = &self.files[index];
        tokio::fs::read(path).await.map_err(|source| ViewError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn title_candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        if let Ok(title) = std::fs::read_to_string(self.root.join("title.txt")) {
            candidates.push(title.trim().to_string());
        }
        if let Some(name) = self.root.file_name() {
            candidates.push(name.to_string_lossy().into_owned());
        }
        candidates
    }
}

fn has_tile_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TILE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Compares filenames treating digit runs as numbers.
fn compare_natural(a: &str, b: &str) -> CmpOrdering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return CmpOrdering::Equal,
            (None, Some(_)) => return CmpOrdering::Less,
            (Some(_), None) => return CmpOrdering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_number(&mut a_chars);
                let right = take_number(&mut b_chars);
                // Compare by magnitude first, then by length so "01" != "1".
                let ord = left
                    .trim_start_matches('0')
                    .len()
                    .cmp(&right.trim_start_matches('0').len())
                    .then_with(|| left.trim_start_matches('0').cmp(right.trim_start_matches('0')))
                    .then_with(|| left.len().cmp(&right.len()));
                if ord != CmpOrdering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.cmp(&y);
                if ord != CmpOrdering::Equal {
                    return ord;
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}
