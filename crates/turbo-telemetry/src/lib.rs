pub mod metrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "turbo_server" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
    /// Whether to install the Prometheus metrics recorder.
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// The `EnvFilter` directive string used when RUST_LOG is unset.
    pub fn filter_directives(&self) -> String {
        let mut filter_str = self.log_level.to_string().to_lowercase();
        for (module, level) in &self.module_levels {
            filter_str.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
        }
        filter_str
    }
}

/// Keeps handles produced during initialization.
pub struct TelemetryGuard {
    metrics_handle: Option<PrometheusHandle>,
}

impl TelemetryGuard {
    /// Render the Prometheus text exposition, or an empty string.
    pub fn render_metrics(&self) -> String {
        self.metrics_handle
            .as_ref()
            .map(PrometheusHandle::render)
            .unwrap_or_default()
    }
}

/// Initialize the telemetry subsystem. Call once at startup.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .init();

    let metrics_handle = if config.metrics_enabled {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                self::metrics::describe_all();
                tracing::info!("prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install metrics recorder");
                None
            }
        }
    } else {
        None
    };

    TelemetryGuard { metrics_handle }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = TelemetryConfig::default();
        assert_eq!(cfg.log_level, Level::INFO);
        assert!(cfg.module_levels.is_empty());
        assert!(!cfg.json);
        assert!(cfg.metrics_enabled);
    }

    #[test]
    fn filter_directives_include_module_overrides() {
        let cfg = TelemetryConfig {
            log_level: Level::WARN,
            module_levels: vec![
                ("turbo_server".into(), Level::DEBUG),
                ("tower_http".into(), Level::TRACE),
            ],
            ..Default::default()
        };
        assert_eq!(
            cfg.filter_directives(),
            "warn,turbo_server=debug,tower_http=trace"
        );
    }

    #[test]
    fn guard_without_metrics_renders_empty() {
        let guard = TelemetryGuard { metrics_handle: None };
        assert!(guard.render_metrics().is_empty());
    }

    #[test]
    fn guard_renders_from_local_recorder() {
        // build a recorder without installing it globally
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let guard = TelemetryGuard {
            metrics_handle: Some(handle),
        };
        let _ = guard.render_metrics();
    }
}
