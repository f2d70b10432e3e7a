//! Identity resolution for new WebSocket connections.

use axum::http::HeaderMap;
use turbo_core::SubscriberId;

/// Decides which subscriber a new connection belongs to.
///
/// Called once per connection, with the headers of the upgrade request.
/// Connections resolved to the same id share pushes addressed to that id.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> SubscriberId;
}

/// Every connection is its own subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdentity;

impl IdentityResolver for RandomIdentity {
    fn resolve(&self, _headers: &HeaderMap) -> SubscriberId {
        SubscriberId::random()
    }
}

impl<F> IdentityResolver for F
where
    F: Fn(&HeaderMap) -> SubscriberId + Send + Sync,
{
    fn resolve(&self, headers: &HeaderMap) -> SubscriberId {
        self(headers)
    }
}
