use std::time::Duration;

use metrics::{counter, histogram};

use crate::error::ImportError;
use crate::models::FileKind;

/// Metric names recorded by an import.
///
/// No exporter is installed by the binary, so without a global recorder
/// every call is a no-op.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    /// Completed conversions, labelled by file kind
    pub conversions_total: &'static str,
    /// Conversion wall time
    pub conversion_duration: &'static str,
    /// Records produced by conversions
    pub records_converted_total: &'static str,
    /// Records appended to a collection
    pub records_appended_total: &'static str,
    /// Failed operations, labelled by error and operation
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            conversions_total: "iphone2sbr_conversions_total",
            conversion_duration: "iphone2sbr_conversion_duration_seconds",
            records_converted_total: "iphone2sbr_records_converted_total",
            records_appended_total: "iphone2sbr_records_appended_total",
            errors_total: "iphone2sbr_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Record a successful conversion
    pub fn record_conversion(&self, kind: FileKind, records: usize, duration: Duration) {
        counter!(self.conversions_total, "kind" => kind.as_str()).increment(1);
        counter!(self.records_converted_total, "kind" => kind.as_str()).increment(records as u64);
        histogram!(self.conversion_duration, "kind" => kind.as_str()).record(duration.as_secs_f64());
    }

    /// Record records merged into a collection
    pub fn record_append(&self, kind: FileKind, records: usize) {
        counter!(self.records_appended_total, "kind" => kind.as_str()).increment(records as u64);
    }

    /// Record a failed operation
    pub fn record_error(&self, error: &ImportError, operation: &'static str) {
        counter!(
            self.errors_total,
            "type" => error.label(),
            "kind" => error.file_kind().as_str(),
            "operation" => operation
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_names() {
        let collector = MetricsCollector::default();
        assert_eq!(collector.conversions_total, "iphone2sbr_conversions_total");
        assert!(collector.errors_total.starts_with("iphone2sbr_"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let collector = MetricsCollector::default();
        collector.record_conversion(FileKind::CallHistory, 3, Duration::from_millis(5));
        collector.record_append(FileKind::CallHistory, 3);
        collector.record_error(&ImportError::EmptyInput, "convert");
    }
}
