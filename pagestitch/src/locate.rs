//! Page-number hints extracted from tile locators and element attributes.
//!
//! Tile viewers often encode a page number somewhere in the tile URL
//! (`.../page=4`, `.../p4/...`, `..._4.png`) or in a data attribute. Each
//! extraction is an independent pure strategy; strategies are tried in order
//! and the first hit wins.
//!
//! Positional order (`floor(order / slots) + 1`) remains the canonical page
//! assignment. Hints are only used to cross-check it.

use crate::view::TileElement;
use regex::Regex;
use std::sync::OnceLock;

/// A pure extraction strategy over a resource locator.
pub type LocatorStrategy = fn(&str) -> Option<u32>;

/// Element attributes consulted after the locator strategies, in order.
pub const PAGE_ATTRIBUTES: [&str; 4] = ["data-page", "data-page-number", "page", "data-index"];

/// Locator patterns, in priority order. Each has exactly one capture group.
const LOCATOR_PATTERNS: [&str; 9] = [
    r"page=(\d+)",
    r"page/(\d+)",
    r"p(\d+)/",
    r"page-(\d+)",
    r"-p(\d+)-",
    r"_(\d+)\.[^.]+$",
    r"/(\d+)\.",
    r"chunk[_-](\d+)",
    r"section[_-](\d+)",
];

fn locator_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        LOCATOR_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

fn capture_with(index: usize, locator: &str) -> Option<u32> {
    let pattern = locator_patterns().get(index)?;
    pattern
        .captures(locator)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn page_query(locator: &str) -> Option<u32> {
    capture_with(0, locator)
}

fn page_path(locator: &str) -> Option<u32> {
    capture_with(1, locator)
}

fn p_prefixed_dir(locator: &str) -> Option<u32> {
    capture_with(2, locator)
}

fn page_dash(locator: &str) -> Option<u32> {
    capture_with(3, locator)
}

fn dashed_p(locator: &str) -> Option<u32> {
    capture_with(4, locator)
}

fn underscore_suffix(locator: &str) -> Option<u32> {
    capture_with(5, locator)
}

fn numeric_filename(locator: &str) -> Option<u32> {
    capture_with(6, locator)
}

fn chunk_number(locator: &str) -> Option<u32> {
    capture_with(7, locator)
}

fn section_number(locator: &str) -> Option<u32> {
    capture_with(8, locator)
}

/// The built-in locator strategies, in the order they are tried.
pub const DEFAULT_STRATEGIES: [LocatorStrategy; 9] = [
    page_query,
    page_path,
    p_prefixed_dir,
    page_dash,
    dashed_p,
    underscore_suffix,
    numeric_filename,
    chunk_number,
    section_number,
];

/// Ordered page-hint extractor.
#[derive(Clone)]
pub struct PageLocator {
    strategies: Vec<LocatorStrategy>,
    attributes: Vec<String>,
}

impl Default for PageLocator {
    fn default() -> Self {
        Self {
            strategies: DEFAULT_STRATEGIES.to_vec(),
            attributes: PAGE_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl PageLocator {
    /// Creates a locator with explicit strategies and attribute fallbacks.
    pub fn new(strategies: Vec<LocatorStrategy>, attributes: Vec<String>) -> Self {
        Self {
            strategies,
            attributes,
        }
    }

    /// First page number any locator strategy finds.
    pub fn from_locator(&self, locator: &str) -> Option<u32> {
        self.strategies.iter().find_map(|strategy| strategy(locator))
    }

    /// Page hint for an element: locator strategies first, then attributes.
    pub fn page_hint(&self, element: &TileElement) -> Option<u32> {
        self.from_locator(&element.source_key).or_else(|| {
            self.attributes.iter().find_map(|name| {
                element
                    .attributes
                    .get(name)
                    .and_then(|v| v.trim().parse().ok())
            })
        })
    }
}

/// Canonical (page, slot) for a discovery index.
///
/// Pages are 1-based, slots 0-based. A zero `slots_per_page` is treated as 1.
pub fn positional(discovery_order: usize, slots_per_page: usize) -> (u32, usize) {
    let slots = slots_per_page.max(1);
    let page = (discovery_order / slots) as u32 + 1;
    (page, discovery_order % slots)
}
