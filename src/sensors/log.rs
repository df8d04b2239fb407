//! Logging capability handed to the sensor provider

use super::reading::SensorKind;

/// Receives failure lines produced while reading a sensor
pub trait LogSink: Send + Sync {
    fn error(&self, kind: SensorKind, line: &str);
}

/// Forwards to `tracing` at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn error(&self, kind: SensorKind, line: &str) {
        tracing::error!(sensor = %kind, "{}", line);
    }
}
