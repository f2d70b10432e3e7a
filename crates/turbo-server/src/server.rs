use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use turbo_core::{Payload, SubscriberId};

use crate::broadcast::{Broadcaster, PushReport, Target};
use crate::config::{ServerConfig, TurboConfig};
use crate::health::HealthResponse;
use crate::identity::{IdentityResolver, RandomIdentity};
use crate::registry::SubscriberRegistry;
use crate::script::{self, ScriptSource};
use crate::socket;

/// Errors raised while configuring or starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid websocket route {0:?}: must start with '/'")]
    InvalidRoute(String),
    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}

struct Inner {
    config: TurboConfig,
    registry: Arc<SubscriberRegistry>,
    broadcaster: Broadcaster,
    resolver: Box<dyn IdentityResolver>,
    start_time: Instant,
}

/// Handle to the push layer. Cheap to clone; share it with handlers and
/// background tasks.
#[derive(Clone)]
pub struct Turbo {
    inner: Arc<Inner>,
}

impl Turbo {
    pub fn builder() -> TurboBuilder {
        TurboBuilder::default()
    }

    /// Turbo with the given config and random per-connection identities.
    pub fn new(config: TurboConfig) -> Result<Self, ServerError> {
        Self::builder().config(config).build()
    }

    fn from_parts(config: TurboConfig, resolver: Box<dyn IdentityResolver>) -> Self {
        let registry = Arc::new(SubscriberRegistry::new());
        Self {
            inner: Arc::new(Inner {
                config,
                broadcaster: Broadcaster::new(Arc::clone(&registry)),
                registry,
                resolver,
                start_time: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> &TurboConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.inner.registry
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.inner.broadcaster
    }

    pub fn start_time(&self) -> Instant {
        self.inner.start_time
    }

    /// Resolve the subscriber for a new connection.
    pub fn resolve_identity(&self, headers: &HeaderMap) -> SubscriberId {
        self.inner.resolver.resolve(headers)
    }

    /// Push instructions to connected subscribers. See [`Broadcaster::push`].
    pub fn push(&self, payload: impl Into<Payload>, to: impl Into<Target>) -> PushReport {
        self.inner.broadcaster.push(payload, to)
    }

    /// See [`Broadcaster::can_push`].
    pub fn can_push(&self, to: Option<&SubscriberId>) -> bool {
        self.inner.broadcaster.can_push(to)
    }

    /// Script markup for the page `<head>`.
    pub fn script(&self, source: &ScriptSource) -> String {
        script::render(source, self.config().websocket_route())
    }

    /// Routes owned by the push layer: the WebSocket endpoint, when enabled.
    pub fn routes<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        match self.config().websocket_route() {
            Some(route) => Router::new()
                .route(route, get(socket::ws_handler))
                .with_state(self.clone()),
            None => Router::new(),
        }
    }
}

impl Default for Turbo {
    fn default() -> Self {
        Self::from_parts(TurboConfig::default(), Box::new(RandomIdentity))
    }
}

/// Configuration-time setup of a [`Turbo`].
#[derive(Default)]
pub struct TurboBuilder {
    config: TurboConfig,
    resolver: Option<Box<dyn IdentityResolver>>,
}

impl TurboBuilder {
    pub fn config(mut self, config: TurboConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default random identity with an application-specific one.
    pub fn identity(mut self, resolver: impl IdentityResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn build(self) -> Result<Turbo, ServerError> {
        if let Some(route) = self.config.websocket_route() {
            if !route.starts_with('/') {
                return Err(ServerError::InvalidRoute(route.to_owned()));
            }
        }
        let resolver = self.resolver.unwrap_or_else(|| Box::new(RandomIdentity));
        Ok(Turbo::from_parts(self.config, resolver))
    }
}

/// Merge the application's routes with the push layer and `/health`.
pub fn build_router(turbo: &Turbo, app: Router) -> Router {
    let health = Router::new()
        .route("/health", get(health_handler))
        .with_state(turbo.clone());

    app.merge(turbo.routes())
        .merge(health)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve. Returns a handle that keeps the server task alive.
pub async fn start(
    config: ServerConfig,
    turbo: Turbo,
    app: Router,
) -> Result<ServerHandle, ServerError> {
    let router = build_router(&turbo, app);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        addr = %local_addr,
        websocket_route = ?turbo.config().websocket_route(),
        "turbo server started"
    );

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "server stopped");
        }
    });

    Ok(ServerHandle {
        local_addr,
        turbo,
        server,
    })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    pub local_addr: SocketAddr,
    turbo: Turbo,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn turbo(&self) -> &Turbo {
        &self.turbo
    }

    /// Stop accepting connections.
    pub fn shutdown(self) {
        self.server.abort();
    }
}

/// GET /health
async fn health_handler(State(turbo): State<Turbo>) -> Json<HealthResponse> {
    Json(HealthResponse::snapshot(turbo.registry(), turbo.start_time()))
}
