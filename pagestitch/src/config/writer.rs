//! INI serialization: `ConfigFile` → commented INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[discovery]
; Wait after scrolling the view to the top before the first poll (milliseconds)
settle_delay_ms = {}
; Time between polls of the view (milliseconds)
poll_interval_ms = {}
; Discovery ends after this many consecutive polls without a new tile
stable_polls = {}
; Give up if the tile count is still changing after this long (seconds)
max_wait_secs = {}

[layout]
; Tiles stacked vertically on one page
slots_per_page = {}
; Size of the composited page raster (pixels)
page_width_px = {}
page_height_px = {}
; Compare page numbers found in tile URLs against the positional page and
; warn on mismatch (true/false)
verify_page_hints = {}

[decode]
; JPEG quality used when re-encoding tiles and page images (1-100)
jpeg_quality = {}
; A tile that does not load within this many seconds fails the run
load_timeout_secs = {}
; Largest tile width or height accepted by the decoder (pixels)
max_tile_dimension = {}

[output]
; Directory the document is written to
directory = {}
; Page size handed to the document encoder (default: A4 in points)
page_width = {}
page_height = {}
; Unit of page_width/page_height: pt, mm or in
unit = {}
; Page image encoding: jpeg or raw
image_format = {}
; Filename used when the view has no title
default_title = {}

[logging]
; Log file, cleared at startup
file = {}
"#,
        config.discovery.settle_delay_ms,
        config.discovery.poll_interval_ms,
        config.discovery.stable_polls,
        config.discovery.max_wait_secs,
        config.layout.slots_per_page,
        config.layout.page_width_px,
        config.layout.page_height_px,
        config.layout.verify_page_hints,
        config.decode.jpeg_quality,
        config.decode.load_timeout_secs,
        config.decode.max_tile_dimension,
        path_to_string(&config.output.directory),
        config.output.page_width,
        config.output.page_height,
        config.output.unit,
        config.output.image_format,
        config.output.default_title,
        path_to_string(&config.logging.file),
    )
}

/// Renders a path, collapsing the home directory back to `~`.
pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
