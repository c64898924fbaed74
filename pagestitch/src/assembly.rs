//! Page assembly.
//!
//! Groups discovered tiles into fixed-size page groups by their canonical
//! page and slot indices. Only complete groups are promoted; incomplete ones
//! are dropped with a warning naming the missing slots.

use crate::observer::Tile;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Assembly failures.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Not a single page group had all of its slots filled
    #[error("no complete pages ({tiles} tiles, {incomplete} incomplete pages)")]
    NoCompletePages { tiles: usize, incomplete: usize },
}

/// The tiles assigned to one page, indexed by slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGroup {
    pub page_index: u32,
    pub slots: Vec<Option<Tile>>,
}

impl PageGroup {
    /// Creates an empty group with `slots_per_page` slots.
    pub fn new(page_index: u32, slots_per_page: usize) -> Self {
        Self {
            page_index,
            slots: vec![None; slots_per_page],
        }
    }

    /// Places a tile in its slot. Out-of-range slots are ignored.
    pub fn place(&mut self, tile: Tile) {
        if let Some(slot) = self.slots.get_mut(tile.slot_index) {
            if slot.is_none() {
                *slot = Some(tile);
            }
        }
    }

    /// True when every slot holds a tile.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Indices of empty slots, ascending.
    pub fn missing_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Promotes a complete group, or hands the group back unchanged.
    pub fn into_complete(self) -> Result<CompletePage, PageGroup> {
        if !self.is_complete() {
            return Err(self);
        }
        Ok(CompletePage {
            page_index: self.page_index,
            tiles: self.slots.into_iter().flatten().collect(),
        })
    }
}

/// A page group with every slot filled. Tiles are in slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletePage {
    pub page_index: u32,
    pub tiles: Vec<Tile>,
}

/// A dropped page and the slots it was missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompletePage {
    pub page_index: u32,
    pub missing_slots: Vec<usize>,
}

/// Result of grouping.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// Complete pages, strictly ascending by page index
    pub pages: Vec<CompletePage>,
    /// Dropped pages, ascending by page index
    pub incomplete: Vec<IncompletePage>,
}

/// Partitions tiles into pages and keeps only the complete ones.
///
/// Pages are processed in ascending page index regardless of the order the
/// tiles arrive in. Returns [`AssemblyError::NoCompletePages`] when nothing
/// survives, including when `tiles` is empty.
pub fn group_by_page(tiles: Vec<Tile>, slots_per_page: usize) -> Result<Assembly, AssemblyError> {
    let slots_per_page = slots_per_page.max(1);
    let tile_count = tiles.len();

    let mut groups: BTreeMap<u32, PageGroup> = BTreeMap::new();
    for tile in tiles {
        groups
            .entry(tile.page_index)
            .or_insert_with(|| PageGroup::new(tile.page_index, slots_per_page))
            .place(tile);
    }

    let mut pages = Vec::with_capacity(groups.len());
    let mut incomplete = Vec::new();
    for group in groups.into_values() {
        match group.into_complete() {
            Ok(page) => pages.push(page),
            Err(group) => {
                let missing = group.missing_slots();
                warn!(
                    page = group.page_index,
                    missing_slots = ?missing,
                    "Dropping incomplete page"
                );
                incomplete.push(IncompletePage {
                    page_index: group.page_index,
                    missing_slots: missing,
                });
            }
        }
    }

    if pages.is_empty() {
        return Err(AssemblyError::NoCompletePages {
            tiles: tile_count,
            incomplete: incomplete.len(),
        });
    }

    debug!(
        complete = pages.len(),
        dropped = incomplete.len(),
        "Grouped tiles into pages"
    );
    Ok(Assembly { pages, incomplete })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::positional;
    use proptest::prelude::*;

    fn tile(order: usize, slots: usize) -> Tile {
        let (page_index, slot_index) = positional(order, slots);
        Tile {
            source_key: format!("tile-{}", order),
            discovery_order: order,
            page_index,
            slot_index,
            pixel_width: 100,
            pixel_height: 20,
            page_hint: None,
        }
    }

    #[test]
    fn test_complete_pages_in_order() {
        let tiles: Vec<Tile> = (0..18).rev().map(|i| tile(i, 6)).collect();

        let assembly = group_by_page(tiles, 6).unwrap();

        let indices: Vec<u32> = assembly.pages.iter().map(|p| p.page_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(assembly.incomplete.is_empty());
        for page in &assembly.pages {
            let slots: Vec<usize> = page.tiles.iter().map(|t| t.slot_index).collect();
            assert_eq!(slots, vec![0, 1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_drops_page_missing_slot_four() {
        // Page 1 complete; page 2 has slots {0,1,2,3,5}.
        let tiles: Vec<Tile> = (0..12).filter(|&i| i != 10).map(|i| tile(i, 6)).collect();

        let assembly = group_by_page(tiles, 6).unwrap();

        assert_eq!(assembly.pages.len(), 1);
        assert_eq!(assembly.pages[0].page_index, 1);
        assert_eq!(
            assembly.incomplete,
            vec![IncompletePage {
                page_index: 2,
                missing_slots: vec![4],
            }]
        );
    }

    #[test]
    fn test_trailing_partial_page_dropped() {
        let tiles: Vec<Tile> = (0..8).map(|i| tile(i, 6)).collect();

        let assembly = group_by_page(tiles, 6).unwrap();

        assert_eq!(assembly.pages.len(), 1);
        assert_eq!(assembly.incomplete[0].missing_slots, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_is_fatal() {
        let result = group_by_page(Vec::new(), 6);
        assert!(matches!(
            result,
            Err(AssemblyError::NoCompletePages { tiles: 0, .. })
        ));
    }

    #[test]
    fn test_only_incomplete_is_fatal() {
        let tiles: Vec<Tile> = (0..5).map(|i| tile(i, 6)).collect();
        let result = group_by_page(tiles, 6);
        assert!(matches!(
            result,
            Err(AssemblyError::NoCompletePages {
                tiles: 5,
                incomplete: 1
            })
        ));
    }

    #[test]
    fn test_page_group_into_complete_returns_group_when_missing() {
        let mut group = PageGroup::new(3, 2);
        group.place(tile(4, 2));
        let group = group.into_complete().unwrap_err();
        assert_eq!(group.missing_slots(), vec![1]);
    }

    proptest! {
        #[test]
        fn prop_pages_ascending_and_complete(
            slots in 1usize..8,
            count in 0usize..60,
            drop in proptest::collection::vec(any::<bool>(), 60),
            seed in any::<u64>(),
        ) {
            let mut tiles: Vec<Tile> = (0..count)
                .filter(|&i| !drop[i] || i % 3 != 0)
                .map(|i| tile(i, slots))
                .collect();
            // Deterministic shuffle
            let len = tiles.len();
            if len > 1 {
                for i in 0..len {
                    let j = ((seed.wrapping_mul(i as u64 + 1)) % len as u64) as usize;
                    tiles.swap(i, j);
                }
            }
            let total = tiles.len();

            match group_by_page(tiles, slots) {
                Ok(assembly) => {
                    let pages: Vec<u32> = assembly.pages.iter().map(|p| p.page_index).collect();
                    prop_assert!(pages.windows(2).all(|w| w[0] < w[1]));
                    for page in &assembly.pages {
                        prop_assert_eq!(page.tiles.len(), slots);
                        for (slot, t) in page.tiles.iter().enumerate() {
                            prop_assert_eq!(t.slot_index, slot);
                            prop_assert_eq!(t.page_index, page.page_index);
                        }
                    }
                    for dropped in &assembly.incomplete {
                        prop_assert!(!dropped.missing_slots.is_empty());
                        prop_assert!(!pages.contains(&dropped.page_index));
                    }
                    let kept: usize = assembly.pages.len() * slots;
                    prop_assert!(kept <= total);
                }
                Err(AssemblyError::NoCompletePages { tiles, .. }) => {
                    prop_assert_eq!(tiles, total);
                }
            }
        }
    }
}
