//! Demo server: a page whose load-average panel is refreshed over a Turbo
//! Stream socket every few seconds.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tracing::Level;
use turbo_core::stream;
use turbo_server::{
    AcceptsTurboStream, ScriptSource, ServerConfig, Target, Turbo, TurboConfig, TurboStream,
};
use turbo_telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};

#[derive(Debug, Parser)]
#[command(name = "turbo", about = "Turbo Stream push demo")]
struct Args {
    /// Address to bind.
    #[arg(long, env = "TURBO_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 picks a free one).
    #[arg(long, env = "TURBO_PORT", default_value_t = 5000)]
    port: u16,

    /// Path of the WebSocket endpoint.
    #[arg(long, env = "TURBO_WEBSOCKET_ROUTE", default_value = "/turbo-stream")]
    websocket_route: String,

    /// Serve pages without the push socket.
    #[arg(long)]
    no_websocket: bool,

    /// Seconds between load-average pushes.
    #[arg(long, env = "TURBO_REFRESH_SECS", default_value_t = 5)]
    refresh_secs: u64,

    /// Log as JSON lines.
    #[arg(long, env = "TURBO_LOG_JSON")]
    log_json: bool,

    /// Default log level when RUST_LOG is unset.
    #[arg(long, env = "TURBO_LOG_LEVEL", default_value = "info")]
    log_level: Level,
}

#[derive(Clone)]
struct AppState {
    turbo: Turbo,
    telemetry: Arc<TelemetryGuard>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let telemetry = init_telemetry(TelemetryConfig {
        log_level: args.log_level,
        json: args.log_json,
        ..TelemetryConfig::default()
    });

    let turbo_config = TurboConfig {
        websocket_route: (!args.no_websocket).then(|| args.websocket_route.clone()),
        ..TurboConfig::default()
    };
    let turbo = Turbo::new(turbo_config).context("invalid turbo configuration")?;

    let state = AppState {
        turbo: turbo.clone(),
        telemetry: Arc::new(telemetry),
    };
    let app = Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .with_state(state);

    let refresh = Duration::from_secs(args.refresh_secs.max(1));
    tokio::spawn(refresh_load(turbo.clone(), refresh));

    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };
    let handle = turbo_server::start(config, turbo, app)
        .await
        .context("failed to start server")?;
    tracing::info!(port = handle.port(), "demo ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;
    tracing::info!("shutting down");
    handle.shutdown();
    Ok(())
}

/// GET /: full page, or just the panel when the client asks for a stream.
async fn index(
    State(state): State<AppState>,
    AcceptsTurboStream(wants_stream): AcceptsTurboStream,
) -> Response {
    let panel = load_panel();
    if wants_stream {
        return TurboStream::new(stream::replace(panel, "load")).into_response();
    }
    let script = state.turbo.script(&ScriptSource::default());
    Html(format!(
        r#"<!doctype html>
<html>
<head>
<title>Load average</title>
{script}
</head>
<body>
<h1>Load average</h1>
{panel}
</body>
</html>"#
    ))
    .into_response()
}

/// GET /metrics in Prometheus text format.
async fn metrics(State(state): State<AppState>) -> String {
    state.telemetry.render_metrics()
}

async fn refresh_load(turbo: Turbo, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        if !turbo.can_push(None) {
            continue;
        }
        let report = turbo.push(stream::replace(load_panel(), "load"), Target::All);
        tracing::debug!(
            attempted = report.attempted,
            delivered = report.delivered,
            "pushed load average"
        );
    }
}

fn load_panel() -> String {
    let [one, five, fifteen] = read_loadavg();
    format!(
        r#"<div id="load"><table>
<tr><td>1 min</td><td>{one}</td></tr>
<tr><td>5 min</td><td>{five}</td></tr>
<tr><td>15 min</td><td>{fifteen}</td></tr>
</table></div>"#
    )
}

/// Load averages from `/proc/loadavg`, or dashes where unavailable.
fn read_loadavg() -> [String; 3] {
    let raw = std::fs::read_to_string("/proc/loadavg").unwrap_or_default();
    let mut fields = raw.split_whitespace().map(str::to_owned);
    std::array::from_fn(|_| fields.next().unwrap_or_else(|| "-".into()))
}
