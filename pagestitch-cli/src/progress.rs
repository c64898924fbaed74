//! Terminal progress line.

use console::{style, Term};
use pagestitch::progress::ProgressSink;
use std::sync::Mutex;
use tracing::debug;

/// Renders pipeline progress on stderr.
///
/// On a terminal the line is rewritten in place and cleared when the run
/// hides it. Otherwise every message is printed on its own line.
pub struct ConsoleProgress {
    term: Term,
    last: Mutex<Option<String>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            last: Mutex::new(None),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn update(&self, message: &str, visible: bool) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        debug!(target: "pagestitch::progress", message, visible, "Progress");

        let interactive = self.term.is_term();
        if !visible {
            if interactive && last.is_some() {
                let _ = self.term.clear_line();
            }
            *last = None;
            return;
        }
        if last.as_deref() == Some(message) {
            return;
        }

        let line = if message.starts_with("Error:") {
            style(message).red().to_string()
        } else {
            format!("{} {}", style("›").cyan().bold(), message)
        };
        let _ = if interactive {
            self.term
                .clear_line()
                .and_then(|_| self.term.write_str(&line))
        } else {
            self.term.write_line(&line)
        };
        *last = Some(message.to_string());
    }
}
