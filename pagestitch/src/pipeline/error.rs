//! Error types for a pipeline run.
//!
//! Every stage has its own error enum; the orchestrator folds them into
//! [`PipelineError`]. None of these are retried: a failed run reports the
//! error and a new run starts from scratch.

use crate::assembly::AssemblyError;
use crate::document::DocumentError;
use crate::observer::DiscoveryError;
use crate::raster::CompositeError;
use crate::view::ViewError;
use std::time::Duration;
use thiserror::Error;

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Another run is still in flight
    #[error("a download is already running")]
    AlreadyRunning,

    /// Tile discovery never stabilized
    #[error("tile discovery did not stabilize within {waited:?} ({tiles} tiles seen)")]
    DiscoveryTimeout { waited: Duration, tiles: usize },

    /// Discovery produced no page with every slot filled
    #[error("no complete pages found ({tiles} tiles discovered)")]
    NoCompletePages { tiles: usize },

    /// A tile could not be loaded or decoded
    #[error("failed to decode tile {source_key}: {reason}")]
    TileDecodeError { source_key: String, reason: String },

    /// The document encoder could not be obtained
    #[error("output library unavailable: {0}")]
    OutputLibraryUnavailable(String),

    /// The view could not be read
    #[error("view error: {0}")]
    View(#[from] ViewError),

    /// The document could not be encoded or written
    #[error("failed to write document: {0}")]
    Save(#[source] DocumentError),

    /// Executor or bookkeeping failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DiscoveryError> for PipelineError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::Timeout { waited, tiles } => {
                PipelineError::DiscoveryTimeout { waited, tiles }
            }
            DiscoveryError::View(e) => PipelineError::View(e),
        }
    }
}

impl From<AssemblyError> for PipelineError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::NoCompletePages { tiles, .. } => PipelineError::NoCompletePages { tiles },
        }
    }
}

impl From<CompositeError> for PipelineError {
    fn from(err: CompositeError) -> Self {
        match err {
            CompositeError::TileDecode { source_key, reason } => {
                PipelineError::TileDecodeError { source_key, reason }
            }
            CompositeError::Load { source_key, source } => PipelineError::TileDecodeError {
                source_key,
                reason: source.to_string(),
            },
            CompositeError::Internal(msg) => PipelineError::Internal(msg),
        }
    }
}

impl From<DocumentError> for PipelineError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Unavailable(msg) => PipelineError::OutputLibraryUnavailable(msg),
            other => PipelineError::Save(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_timeout_maps() {
        let err: PipelineError = DiscoveryError::Timeout {
            waited: Duration::from_secs(4),
            tiles: 9,
        }
        .into();
        assert!(matches!(
            err,
            PipelineError::DiscoveryTimeout { tiles: 9, .. }
        ));
    }

    #[test]
    fn test_load_failure_is_tile_decode_error() {
        let err: PipelineError = CompositeError::Load {
            source_key: "k".to_string(),
            source: ViewError::UnknownTile("k".to_string()),
        }
        .into();
        match err {
            PipelineError::TileDecodeError { source_key, reason } => {
                assert_eq!(source_key, "k");
                assert_eq!(reason, "unknown tile: k");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_document_errors_split() {
        let unavailable: PipelineError = DocumentError::Unavailable("x".to_string()).into();
        assert!(matches!(unavailable, PipelineError::OutputLibraryUnavailable(_)));

        let encode: PipelineError = DocumentError::Encode("y".to_string()).into();
        assert!(matches!(encode, PipelineError::Save(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            PipelineError::NoCompletePages { tiles: 0 }.to_string(),
            "no complete pages found (0 tiles discovered)"
        );
        assert_eq!(
            PipelineError::AlreadyRunning.to_string(),
            "a download is already running"
        );
    }
}
