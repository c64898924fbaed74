//! Discovered tiles and the deduplicating tile set.

use crate::locate::positional;
use std::collections::HashMap;

/// A discovered tile with its canonical position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Unique identity (resolved resource locator)
    pub source_key: String,
    /// Insertion index into the tile set
    pub discovery_order: usize,
    /// 1-based page index
    pub page_index: u32,
    /// 0-based slot within the page
    pub slot_index: usize,
    /// Natural width in pixels
    pub pixel_width: u32,
    /// Natural height in pixels
    pub pixel_height: u32,
    /// Page number suggested by the locator or attributes, if any
    pub page_hint: Option<u32>,
}

/// Tiles keyed by source locator.
///
/// Insertion is write-once: a second insert for the same key is a no-op, so a
/// tile keeps the discovery order it was first seen with.
#[derive(Debug, Clone)]
pub struct TileSet {
    slots_per_page: usize,
    by_key: HashMap<String, usize>,
    tiles: Vec<Tile>,
}

impl TileSet {
    /// Creates an empty set laying tiles out `slots_per_page` to a page.
    pub fn new(slots_per_page: usize) -> Self {
        Self {
            slots_per_page: slots_per_page.max(1),
            by_key: HashMap::new(),
            tiles: Vec::new(),
        }
    }

    /// Inserts a tile if its key is new. Returns the stored tile when inserted.
    pub fn insert(
        &mut self,
        source_key: &str,
        width: u32,
        height: u32,
        page_hint: Option<u32>,
    ) -> Option<&Tile> {
        if self.by_key.contains_key(source_key) {
            return None;
        }
        let order = self.tiles.len();
        let (page_index, slot_index) = positional(order, self.slots_per_page);
        self.by_key.insert(source_key.to_string(), order);
        self.tiles.push(Tile {
            source_key: source_key.to_string(),
            discovery_order: order,
            page_index,
            slot_index,
            pixel_width: width,
            pixel_height: height,
            page_hint,
        });
        self.tiles.last()
    }

    /// Looks a tile up by key.
    pub fn get(&self, source_key: &str) -> Option<&Tile> {
        self.by_key.get(source_key).map(|&i| &self.tiles[i])
    }

    pub fn contains(&self, source_key: &str) -> bool {
        self.by_key.contains_key(source_key)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Pages needed to hold every tile: `ceil(len / slots_per_page)`.
    pub fn page_count(&self) -> usize {
        self.tiles.len().div_ceil(self.slots_per_page)
    }

    /// Consumes the set, yielding tiles in discovery order.
    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_positions() {
        let mut set = TileSet::new(6);
        for i in 0..8 {
            set.insert(&format!("t{}", i), 10, 10, None);
        }

        let t7 = set.get("t7").unwrap();
        assert_eq!(t7.discovery_order, 7);
        assert_eq!(t7.page_index, 2);
        assert_eq!(t7.slot_index, 1);
        assert_eq!(set.page_count(), 2);
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let mut set = TileSet::new(6);
        assert!(set.insert("a", 10, 10, None).is_some());
        assert!(set.insert("b", 10, 10, None).is_some());
        assert!(set.insert("a", 99, 99, Some(4)).is_none());

        assert_eq!(set.len(), 2);
        let a = set.get("a").unwrap();
        assert_eq!(a.discovery_order, 0);
        assert_eq!(a.pixel_width, 10);
        assert_eq!(a.page_hint, None);
    }

    #[test]
    fn test_empty_set() {
        let set = TileSet::new(6);
        assert!(set.is_empty());
        assert_eq!(set.page_count(), 0);
    }
}
