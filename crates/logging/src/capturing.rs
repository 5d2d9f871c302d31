use std::sync::Mutex;

use crate::level::LogLevel;
use crate::logger::Logger;

/// A [`Logger`] that records every `(level, message)` pair in memory
/// instead of emitting through `tracing`, so tests can assert on what was
/// logged without scraping stderr text.
#[derive(Debug, Default)]
pub struct CapturingLogger {
    events: Mutex<Vec<(LogLevel, String)>>,
}

impl CapturingLogger {
    /// Creates an empty capturing logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every `(level, message)` pair logged so far.
    #[must_use]
    pub fn events(&self) -> Vec<(LogLevel, String)> {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Clears recorded events.
    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
    }
}

impl Logger for CapturingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}
