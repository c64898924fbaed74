//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use crate::document::{ImageFormat, PageFormat, Unit};
use crate::observer::DiscoveryConfig;
use crate::pipeline::PipelineConfig;
use crate::raster::{PageLayout, RasterConfig, TileDecoder};
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Tile discovery polling
    pub discovery: DiscoverySettings,
    /// Page geometry
    pub layout: LayoutSettings,
    /// Tile decoding
    pub decode: DecodeSettings,
    /// Output document
    pub output: OutputSettings,
    /// Logging
    pub logging: LoggingSettings,
}

/// `[discovery]`
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySettings {
    /// Wait after scrolling to the top, in milliseconds
    pub settle_delay_ms: u64,
    /// Time between polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Consecutive unchanged polls that end discovery
    pub stable_polls: u32,
    /// Overall discovery budget, in seconds
    pub max_wait_secs: u64,
}

/// `[layout]`
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSettings {
    pub slots_per_page: usize,
    pub page_width_px: u32,
    pub page_height_px: u32,
    /// Warn when locator page hints disagree with positional pages
    pub verify_page_hints: bool,
}

/// `[decode]`
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeSettings {
    /// JPEG re-encode quality, 1-100
    pub jpeg_quality: u8,
    /// Per-tile load timeout, in seconds
    pub load_timeout_secs: u64,
    /// Largest accepted tile width or height
    pub max_tile_dimension: u32,
}

/// `[output]`
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub page_width: f32,
    pub page_height: f32,
    pub unit: Unit,
    pub image_format: ImageFormat,
    /// Filename stem used when the view has no title
    pub default_title: String,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl ConfigFile {
    /// Builds the pipeline settings these values describe.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let discovery = DiscoveryConfig {
            settle_delay: Duration::from_millis(self.discovery.settle_delay_ms),
            poll_interval: Duration::from_millis(self.discovery.poll_interval_ms),
            stable_polls: self.discovery.stable_polls,
            max_wait: Duration::from_secs(self.discovery.max_wait_secs),
            slots_per_page: self.layout.slots_per_page,
            verify_page_hints: self.layout.verify_page_hints,
        };
        let raster = RasterConfig {
            layout: PageLayout {
                width_px: self.layout.page_width_px,
                height_px: self.layout.page_height_px,
                slots: self.layout.slots_per_page,
            },
            decoder: TileDecoder::new(self.decode.jpeg_quality, self.decode.max_tile_dimension),
            load_timeout: Duration::from_secs(self.decode.load_timeout_secs),
        };

        PipelineConfig {
            discovery,
            raster,
            page_format: PageFormat {
                width: self.output.page_width,
                height: self.output.page_height,
                unit: self.output.unit,
            },
            image_format: self.output.image_format,
            output_dir: self.output.directory.clone(),
            title: None,
            default_title: self.output.default_title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_from_defaults() {
        let config = ConfigFile::default();
        let pipeline = config.pipeline_config();

        assert_eq!(pipeline.discovery.settle_delay, Duration::from_millis(2000));
        assert_eq!(pipeline.discovery.poll_interval, Duration::from_millis(2000));
        assert_eq!(pipeline.discovery.stable_polls, 3);
        assert_eq!(pipeline.discovery.max_wait, Duration::from_secs(600));
        assert_eq!(pipeline.discovery.slots_per_page, 6);
        assert_eq!(pipeline.raster.layout.slots, 6);
        assert_eq!(pipeline.raster.layout.width_px, 1240);
        assert_eq!(pipeline.raster.decoder.quality(), 75);
        assert_eq!(pipeline.page_format.width, 595.28);
        assert_eq!(pipeline.image_format, ImageFormat::Jpeg);
        assert_eq!(pipeline.default_title, "document");
        assert!(pipeline.title.is_none());
    }

    #[test]
    fn test_slots_flow_into_discovery_and_layout() {
        let mut config = ConfigFile::default();
        config.layout.slots_per_page = 4;
        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.discovery.slots_per_page, 4);
        assert_eq!(pipeline.raster.layout.slots, 4);
    }
}
