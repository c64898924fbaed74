//! Progress reporting.
//!
//! The pipeline reports human-readable status lines through a
//! [`ProgressSink`]. Sinks are best-effort: they return nothing and must not
//! block the pipeline.

use tracing::info;

/// Receives progress messages.
pub trait ProgressSink: Send + Sync {
    /// Shows `message`, or hides the indicator when `visible` is false.
    fn update(&self, message: &str, visible: bool);
}

/// Sink that forwards progress lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn update(&self, message: &str, visible: bool) {
        if visible && !message.is_empty() {
            info!(target: "pagestitch::progress", "{}", message);
        }
    }
}

/// Silent sink for tests and embedding.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressSink for NoOpProgress {
    fn update(&self, _message: &str, _visible: bool) {}
}

/// Sink that records every update, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    updates: std::sync::Mutex<Vec<(String, bool)>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages shown so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    /// The last update, if any.
    pub fn last(&self) -> Option<(String, bool)> {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

impl ProgressSink for RecordingProgress {
    fn update(&self, message: &str, visible: bool) {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((message.to_string(), visible));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_progress() {
        let sink = RecordingProgress::new();
        sink.update("one", true);
        sink.update("", false);

        assert_eq!(sink.messages(), vec!["one".to_string(), String::new()]);
        assert_eq!(sink.last(), Some((String::new(), false)));
    }

    #[test]
    fn test_sinks_usable_as_trait_objects() {
        let sinks: Vec<Box<dyn ProgressSink>> =
            vec![Box::new(TracingProgress), Box::new(NoOpProgress)];
        for sink in sinks {
            sink.update("hello", true);
        }
    }
}
