//! Metric names shared across crates.

use ::metrics::{describe_counter, describe_gauge, Unit};

/// WebSocket connections opened total (counter).
pub const CONNECTIONS_TOTAL: &str = "turbo_connections_total";
/// WebSocket disconnections total (counter).
pub const DISCONNECTIONS_TOTAL: &str = "turbo_disconnections_total";
/// Active WebSocket connections (gauge).
pub const CONNECTIONS_ACTIVE: &str = "turbo_connections_active";
/// Push calls total (counter, labels: target).
pub const PUSHES_TOTAL: &str = "turbo_pushes_total";
/// Per-connection send failures during push (counter, labels: reason).
pub const PUSH_FAILURES_TOTAL: &str = "turbo_push_failures_total";

/// Register descriptions with the installed recorder.
pub fn describe_all() {
    describe_counter!(CONNECTIONS_TOTAL, Unit::Count, "WebSocket connections accepted");
    describe_counter!(DISCONNECTIONS_TOTAL, Unit::Count, "WebSocket connections closed");
    describe_gauge!(CONNECTIONS_ACTIVE, Unit::Count, "WebSocket connections currently registered");
    describe_counter!(PUSHES_TOTAL, Unit::Count, "Push calls issued");
    describe_counter!(PUSH_FAILURES_TOTAL, Unit::Count, "Sends that failed during a push");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_snake_case() {
        let names = [
            CONNECTIONS_TOTAL,
            DISCONNECTIONS_TOTAL,
            CONNECTIONS_ACTIVE,
            PUSHES_TOTAL,
            PUSH_FAILURES_TOTAL,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
            assert!(name.starts_with("turbo_"));
        }
    }

    #[test]
    fn describe_without_recorder_is_noop() {
        describe_all();
    }
}
