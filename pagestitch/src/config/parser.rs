//! INI parsing: `Ini` → `ConfigFile`.
//!
//! [`apply_value`] is the single place where `section.key` names are mapped to
//! struct fields and values are validated. Both file loading and
//! `ConfigKey::set` go through it.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::{MAX_PAGE_DIMENSION_PX, MAX_SLOTS_PER_PAGE};
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Sections recognized in config.ini.
pub(super) const SECTIONS: [&str; 5] = ["discovery", "layout", "decode", "output", "logging"];

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the
/// INI. Unknown sections and keys are ignored.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    for section_name in SECTIONS {
        let Some(section) = ini.section(Some(section_name)) else {
            continue;
        };
        for (key, value) in section.iter() {
            match apply_value(&mut config, section_name, key, value) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(section = section_name, key, "Ignoring unknown config key");
                }
                Err(reason) => {
                    return Err(ConfigFileError::InvalidValue {
                        section: section_name.to_string(),
                        key: key.to_string(),
                        value: value.to_string(),
                        reason,
                    });
                }
            }
        }
    }

    Ok(config)
}

/// Validates `value` and stores it in `config`.
///
/// Returns `Ok(false)` for an unknown key, `Err(reason)` for an invalid value.
pub(super) fn apply_value(
    config: &mut ConfigFile,
    section: &str,
    key: &str,
    value: &str,
) -> Result<bool, String> {
    let value = value.trim();
    match (section, key) {
        ("discovery", "settle_delay_ms") => {
            config.discovery.settle_delay_ms = parse_number(value, "milliseconds")?;
        }
        ("discovery", "poll_interval_ms") => {
            config.discovery.poll_interval_ms = parse_positive(value, "milliseconds")?;
        }
        ("discovery", "stable_polls") => {
            config.discovery.stable_polls = parse_positive(value, "polls")?;
        }
        ("discovery", "max_wait_secs") => {
            config.discovery.max_wait_secs = parse_positive(value, "seconds")?;
        }

        ("layout", "slots_per_page") => {
            config.layout.slots_per_page = parse_bounded(value, 1, MAX_SLOTS_PER_PAGE)?;
        }
        ("layout", "page_width_px") => {
            config.layout.page_width_px = parse_bounded(value, 1, MAX_PAGE_DIMENSION_PX)?;
        }
        ("layout", "page_height_px") => {
            config.layout.page_height_px = parse_bounded(value, 1, MAX_PAGE_DIMENSION_PX)?;
        }
        ("layout", "verify_page_hints") => {
            config.layout.verify_page_hints = parse_bool(value)?;
        }

        ("decode", "jpeg_quality") => {
            config.decode.jpeg_quality = parse_bounded(value, 1u8, 100u8)?;
        }
        ("decode", "load_timeout_secs") => {
            config.decode.load_timeout_secs = parse_positive(value, "seconds")?;
        }
        ("decode", "max_tile_dimension") => {
            config.decode.max_tile_dimension = parse_positive(value, "pixels")?;
        }

        ("output", "directory") => {
            config.output.directory = parse_path(value)?;
        }
        ("output", "page_width") => {
            config.output.page_width = parse_length(value)?;
        }
        ("output", "page_height") => {
            config.output.page_height = parse_length(value)?;
        }
        ("output", "unit") => {
            config.output.unit = value.parse()?;
        }
        ("output", "image_format") => {
            config.output.image_format = value.parse()?;
        }
        ("output", "default_title") => {
            if value.is_empty() {
                return Err("must not be empty".to_string());
            }
            config.output.default_title = value.to_string();
        }

        ("logging", "file") => {
            config.logging.file = parse_path(value)?;
        }

        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_number<T: FromStr>(value: &str, what: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("must be a non-negative integer ({})", what))
}

fn parse_positive<T: FromStr + PartialOrd + Default>(value: &str, what: &str) -> Result<T, String> {
    let n: T = value
        .parse()
        .map_err(|_| format!("must be a positive integer ({})", what))?;
    if n <= T::default() {
        return Err(format!("must be a positive integer ({})", what));
    }
    Ok(n)
}

fn parse_bounded<T>(value: &str, min: T, max: T) -> Result<T, String>
where
    T: FromStr + PartialOrd + std::fmt::Display + Copy,
{
    let reason = || format!("must be an integer between {} and {}", min, max);
    let n: T = value.parse().map_err(|_| reason())?;
    if n < min || n > max {
        return Err(reason());
    }
    Ok(n)
}

fn parse_length(value: &str) -> Result<f32, String> {
    match value.parse::<f32>() {
        Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err("must be a positive number".to_string()),
    }
}

pub(super) fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err("must be true/false, yes/no, 1/0, or on/off".to_string()),
    }
}

fn parse_path(value: &str) -> Result<PathBuf, String> {
    if value.is_empty() {
        return Err("must be a valid path".to_string());
    }
    Ok(expand_tilde(value))
}

/// Expand `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
