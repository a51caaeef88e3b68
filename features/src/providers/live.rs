//! Observational sinks backed by `tracing`.

use super::{Analytics, LogLevel, Logger, Properties};

/// [`Logger`] forwarding to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str, level: LogLevel, category: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(category, "{message}"),
            LogLevel::Info => tracing::info!(category, "{message}"),
            LogLevel::Warning => tracing::warn!(category, "{message}"),
            LogLevel::Error => tracing::error!(category, "{message}"),
        }
    }
}

/// [`Analytics`] recording events as `info` level `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn track(&self, event: &str, properties: Properties) {
        let properties = serde_json::Value::Object(properties.into_iter().collect());
        tracing::info!(target: "analytics", event, %properties, "Analytics event");
    }
}
