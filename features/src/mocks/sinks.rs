//! Recording logger and analytics.

use crate::providers::{Analytics, LogLevel, Logger, Properties};
use std::sync::{Arc, Mutex, PoisonError};

/// One recorded log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Message text
    pub message: String,
    /// Severity
    pub level: LogLevel,
    /// Category
    pub category: String,
}

/// [`Logger`] remembering every line.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RecordingLogger {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything logged so far.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, message: &str, level: LogLevel, category: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                message: message.to_string(),
                level,
                category: category.to_string(),
            });
    }
}

/// [`Analytics`] remembering every event.
#[derive(Debug, Clone, Default)]
pub struct RecordingAnalytics {
    events: Arc<Mutex<Vec<(String, Properties)>>>,
}

impl RecordingAnalytics {
    /// No events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tracked event name, in order.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Every tracked event with its properties.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Properties)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Analytics for RecordingAnalytics {
    fn track(&self, event: &str, properties: Properties) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event.to_string(), properties));
    }
}
