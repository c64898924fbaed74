//! Configuration key access and validation.
//!
//! Type-safe get/set of configuration values by `section.key` name, used by
//! the `config` command.

use std::str::FromStr;
use thiserror::Error;

use super::parser::apply_value;
use super::settings::ConfigFile;
use super::writer::path_to_string;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Discovery settings
    DiscoverySettleDelayMs,
    DiscoveryPollIntervalMs,
    DiscoveryStablePolls,
    DiscoveryMaxWaitSecs,

    // Layout settings
    LayoutSlotsPerPage,
    LayoutPageWidthPx,
    LayoutPageHeightPx,
    LayoutVerifyPageHints,

    // Decode settings
    DecodeJpegQuality,
    DecodeLoadTimeoutSecs,
    DecodeMaxTileDimension,

    // Output settings
    OutputDirectory,
    OutputPageWidth,
    OutputPageHeight,
    OutputUnit,
    OutputImageFormat,
    OutputDefaultTitle,

    // Logging settings
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "layout.slots_per_page").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::DiscoverySettleDelayMs => "discovery.settle_delay_ms",
            ConfigKey::DiscoveryPollIntervalMs => "discovery.poll_interval_ms",
            ConfigKey::DiscoveryStablePolls => "discovery.stable_polls",
            ConfigKey::DiscoveryMaxWaitSecs => "discovery.max_wait_secs",

            ConfigKey::LayoutSlotsPerPage => "layout.slots_per_page",
            ConfigKey::LayoutPageWidthPx => "layout.page_width_px",
            ConfigKey::LayoutPageHeightPx => "layout.page_height_px",
            ConfigKey::LayoutVerifyPageHints => "layout.verify_page_hints",

            ConfigKey::DecodeJpegQuality => "decode.jpeg_quality",
            ConfigKey::DecodeLoadTimeoutSecs => "decode.load_timeout_secs",
            ConfigKey::DecodeMaxTileDimension => "decode.max_tile_dimension",

            ConfigKey::OutputDirectory => "output.directory",
            ConfigKey::OutputPageWidth => "output.page_width",
            ConfigKey::OutputPageHeight => "output.page_height",
            ConfigKey::OutputUnit => "output.unit",
            ConfigKey::OutputImageFormat => "output.image_format",
            ConfigKey::OutputDefaultTitle => "output.default_title",

            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "layout").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "slots_per_page").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::DiscoverySettleDelayMs => config.discovery.settle_delay_ms.to_string(),
            ConfigKey::DiscoveryPollIntervalMs => config.discovery.poll_interval_ms.to_string(),
            ConfigKey::DiscoveryStablePolls => config.discovery.stable_polls.to_string(),
            ConfigKey::DiscoveryMaxWaitSecs => config.discovery.max_wait_secs.to_string(),

            ConfigKey::LayoutSlotsPerPage => config.layout.slots_per_page.to_string(),
            ConfigKey::LayoutPageWidthPx => config.layout.page_width_px.to_string(),
            ConfigKey::LayoutPageHeightPx => config.layout.page_height_px.to_string(),
            ConfigKey::LayoutVerifyPageHints => config.layout.verify_page_hints.to_string(),

            ConfigKey::DecodeJpegQuality => config.decode.jpeg_quality.to_string(),
            ConfigKey::DecodeLoadTimeoutSecs => config.decode.load_timeout_secs.to_string(),
            ConfigKey::DecodeMaxTileDimension => config.decode.max_tile_dimension.to_string(),

            ConfigKey::OutputDirectory => path_to_string(&config.output.directory),
            ConfigKey::OutputPageWidth => config.output.page_width.to_string(),
            ConfigKey::OutputPageHeight => config.output.page_height.to_string(),
            ConfigKey::OutputUnit => config.output.unit.to_string(),
            ConfigKey::OutputImageFormat => config.output.image_format.to_string(),
            ConfigKey::OutputDefaultTitle => config.output.default_title.clone(),

            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Set the value in a config file.
    ///
    /// The value is validated with the same rules used when loading
    /// config.ini; an invalid value leaves `config` unchanged.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        match apply_value(config, self.section(), self.key_name(), value) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ConfigKeyError::UnknownKey(self.name().to_string())),
            Err(reason) => Err(ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            }),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::DiscoverySettleDelayMs,
            ConfigKey::DiscoveryPollIntervalMs,
            ConfigKey::DiscoveryStablePolls,
            ConfigKey::DiscoveryMaxWaitSecs,
            ConfigKey::LayoutSlotsPerPage,
            ConfigKey::LayoutPageWidthPx,
            ConfigKey::LayoutPageHeightPx,
            ConfigKey::LayoutVerifyPageHints,
            ConfigKey::DecodeJpegQuality,
            ConfigKey::DecodeLoadTimeoutSecs,
            ConfigKey::DecodeMaxTileDimension,
            ConfigKey::OutputDirectory,
            ConfigKey::OutputPageWidth,
            ConfigKey::OutputPageHeight,
            ConfigKey::OutputUnit,
            ConfigKey::OutputImageFormat,
            ConfigKey::OutputDefaultTitle,
            ConfigKey::LoggingFile,
        ]
    }
}
