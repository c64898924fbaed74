//! User configuration.
//!
//! Settings are read from `~/.pagestitch/config.ini`:
//!
//! - [`settings`]: one struct per INI section
//! - [`defaults`]: default values and `ConfigFile::default()`
//! - `parser`: INI → [`ConfigFile`], including value validation
//! - `writer`: [`ConfigFile`] → commented INI
//! - `keys`: typed `section.key` access for the `config` command
//!
//! # Example
//!
//! ```no_run
//! use pagestitch::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let pipeline_config = config.pipeline_config();
//! assert_eq!(pipeline_config.discovery.slots_per_page, config.layout.slots_per_page);
//! # Ok::<(), pagestitch::config::ConfigFileError>(())
//! ```

pub mod defaults;
mod file;
mod keys;
mod parser;
pub mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    ConfigFile, DecodeSettings, DiscoverySettings, LayoutSettings, LoggingSettings,
    OutputSettings,
};
