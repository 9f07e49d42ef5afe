use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metrics collection and management
#[derive(Debug, Clone, Copy)]
pub struct MetricsCollector {
    // Database metrics
    pub db_operations_total: &'static str,
    pub db_operation_duration: &'static str,
    pub db_connection_pool_size: &'static str,

    // Scheduling metrics
    pub shifts_created_total: &'static str,
    pub shifts_cancelled_total: &'static str,
    pub confirmation_updates_total: &'static str,
    pub replacements_assigned_total: &'static str,
    pub replacement_candidates: &'static str,
    pub reminders_sent_total: &'static str,
    pub attendance_updates_total: &'static str,

    // Error metrics
    pub errors_total: &'static str,
    pub http_errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            db_operations_total: "roster_db_operations_total",
            db_operation_duration: "roster_db_operation_duration_seconds",
            db_connection_pool_size: "roster_db_connection_pool_size",

            shifts_created_total: "roster_shifts_created_total",
            shifts_cancelled_total: "roster_shifts_cancelled_total",
            confirmation_updates_total: "roster_confirmation_updates_total",
            replacements_assigned_total: "roster_replacements_assigned_total",
            replacement_candidates: "roster_replacement_candidates",
            reminders_sent_total: "roster_reminders_sent_total",
            attendance_updates_total: "roster_attendance_updates_total",

            errors_total: "roster_errors_total",
            http_errors_total: "roster_http_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Record database operation metrics
    pub fn record_db_operation(&self, operation: &str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };

        counter!(self.db_operations_total, "operation" => operation.to_string(), "status" => status)
            .increment(1);
        histogram!(self.db_operation_duration, "operation" => operation.to_string(), "status" => status)
            .record(duration.as_secs_f64());

        if !success {
            counter!(self.errors_total, "type" => "database", "operation" => operation.to_string())
                .increment(1);
        }
    }

    /// Record shifts created by one form submission
    pub fn record_shifts_created(&self, mode: &'static str, count: usize) {
        counter!(self.shifts_created_total, "mode" => mode).increment(count as u64);
    }

    /// Record a confirmation status change
    pub fn record_confirmation_update(&self, status: &'static str) {
        counter!(self.confirmation_updates_total, "status" => status).increment(1);
    }

    /// Record a volunteer swap
    pub fn record_replacement_assigned(&self) {
        counter!(self.replacements_assigned_total).increment(1);
    }

    /// Record the size of the last replacement search
    pub fn record_replacement_search(&self, candidates: usize) {
        gauge!(self.replacement_candidates).set(candidates as f64);
    }

    /// Record a reminder written to the SMS log
    pub fn record_reminder_sent(&self) {
        counter!(self.reminders_sent_total).increment(1);
    }

    /// Record a cancellation that changed a shift
    pub fn record_shift_cancelled(&self) {
        counter!(self.shifts_cancelled_total).increment(1);
    }

    /// Record an attendance edit or review
    pub fn record_attendance_update(&self, source: &'static str) {
        counter!(self.attendance_updates_total, "source" => source).increment(1);
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &'static str, operation: &str) {
        counter!(self.errors_total, "type" => error_type, "operation" => operation.to_string())
            .increment(1);
    }

    /// Record an error response returned by the API
    pub fn record_http_error(&self, kind: &'static str, status: u16) {
        counter!(self.http_errors_total, "kind" => kind, "status" => status.to_string()).increment(1);
    }

    /// Update connection pool size
    pub fn update_connection_pool_size(&self, size: u32) {
        gauge!(self.db_connection_pool_size).set(f64::from(size));
    }
}

/// Performance timing wrapper for metrics
pub struct MetricsTimer {
    collector: MetricsCollector,
    operation: String,
    start: std::time::Instant,
}

impl MetricsTimer {
    pub fn new(collector: MetricsCollector, operation: &str) -> Self {
        Self {
            collector,
            operation: operation.to_string(),
            start: std::time::Instant::now(),
        }
    }

    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed();
        self.collector.record_db_operation(&self.operation, duration, success);
    }
}
