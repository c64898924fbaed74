//! CLI command implementations.
//!
//! - [`config`] - Configuration management (get, set, list, path, init)
//! - [`stitch`] - Rebuild a document from a tile source

pub mod config;
pub mod stitch;
