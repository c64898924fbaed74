//! Default values for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::document::{ImageFormat, Unit, A4};
use crate::logging::DEFAULT_LOG_FILE;
use crate::naming::DEFAULT_TITLE;
use crate::observer::{
    DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY, DEFAULT_SLOTS_PER_PAGE,
    DEFAULT_STABLE_POLLS,
};
use crate::raster::{
    DEFAULT_JPEG_QUALITY, DEFAULT_LOAD_TIMEOUT, DEFAULT_MAX_TILE_DIMENSION,
    DEFAULT_PAGE_HEIGHT_PX, DEFAULT_PAGE_WIDTH_PX,
};

// =============================================================================
// [discovery]
// =============================================================================

pub const DEFAULT_SETTLE_DELAY_MS: u64 = DEFAULT_SETTLE_DELAY.as_millis() as u64;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = DEFAULT_POLL_INTERVAL.as_millis() as u64;
pub const DEFAULT_MAX_WAIT_SECS: u64 = DEFAULT_MAX_WAIT.as_secs();

// =============================================================================
// [layout]
// =============================================================================

/// Upper bound for slots per page.
pub const MAX_SLOTS_PER_PAGE: usize = 64;

/// Upper bound for composited page width and height.
pub const MAX_PAGE_DIMENSION_PX: u32 = 20_000;

// =============================================================================
// [decode]
// =============================================================================

pub const DEFAULT_LOAD_TIMEOUT_SECS: u64 = DEFAULT_LOAD_TIMEOUT.as_secs();

// =============================================================================
// [logging]
// =============================================================================

/// Default log file: `~/.pagestitch/logs/pagestitch.log`.
pub fn default_log_file() -> PathBuf {
    config_directory().join("logs").join(DEFAULT_LOG_FILE)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            discovery: DiscoverySettings {
                settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
                poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
                stable_polls: DEFAULT_STABLE_POLLS,
                max_wait_secs: DEFAULT_MAX_WAIT_SECS,
            },
            layout: LayoutSettings {
                slots_per_page: DEFAULT_SLOTS_PER_PAGE,
                page_width_px: DEFAULT_PAGE_WIDTH_PX,
                page_height_px: DEFAULT_PAGE_HEIGHT_PX,
                verify_page_hints: false,
            },
            decode: DecodeSettings {
                jpeg_quality: DEFAULT_JPEG_QUALITY,
                load_timeout_secs: DEFAULT_LOAD_TIMEOUT_SECS,
                max_tile_dimension: DEFAULT_MAX_TILE_DIMENSION,
            },
            output: OutputSettings {
                directory: PathBuf::from("."),
                page_width: A4.width,
                page_height: A4.height,
                unit: Unit::Pt,
                image_format: ImageFormat::Jpeg,
                default_title: DEFAULT_TITLE.to_string(),
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_SETTLE_DELAY_MS, 2000);
        assert_eq!(DEFAULT_POLL_INTERVAL_MS, 2000);
        assert_eq!(DEFAULT_MAX_WAIT_SECS, 600);
        assert_eq!(DEFAULT_LOAD_TIMEOUT_SECS, 30);
    }

    #[test]
    fn test_default_log_file_under_config_directory() {
        let path = default_log_file();
        assert!(path.starts_with(config_directory()));
        assert!(path.ends_with("logs/pagestitch.log"));
    }
}
