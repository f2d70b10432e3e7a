//! Server and push-layer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default path of the WebSocket endpoint.
pub const DEFAULT_WEBSOCKET_ROUTE: &str = "/turbo-stream";

/// Configuration of the push layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurboConfig {
    /// Path of the WebSocket endpoint. `None` (or an empty string) disables
    /// the endpoint and the client-side connect script.
    pub websocket_route: Option<String>,
    /// Idle read timeout used to poll connection liveness.
    pub idle_timeout_secs: u64,
    /// Interval between server pings.
    pub ping_interval_secs: u64,
    /// Outbound messages buffered per connection before pushes are dropped.
    pub max_send_queue: usize,
}

impl Default for TurboConfig {
    fn default() -> Self {
        Self {
            websocket_route: Some(DEFAULT_WEBSOCKET_ROUTE.into()),
            idle_timeout_secs: 10,
            ping_interval_secs: 30,
            max_send_queue: 256,
        }
    }
}

impl TurboConfig {
    /// Config with the WebSocket endpoint switched off.
    pub fn without_websocket() -> Self {
        Self {
            websocket_route: None,
            ..Self::default()
        }
    }

    /// The endpoint path, if enabled.
    pub fn websocket_route(&self) -> Option<&str> {
        self.websocket_route.as_deref().filter(|r| !r.is_empty())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.max(1))
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }
}

/// Configuration of the HTTP listener.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
