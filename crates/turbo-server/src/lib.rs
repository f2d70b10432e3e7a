pub mod broadcast;
pub mod config;
pub mod connection;
pub mod health;
pub mod identity;
pub mod registry;
pub mod response;
pub mod script;
pub mod server;
pub mod socket;

pub use broadcast::{Broadcaster, PushReport, Target};
pub use config::{ServerConfig, TurboConfig};
pub use connection::{Connection, SendError};
pub use identity::{IdentityResolver, RandomIdentity};
pub use registry::SubscriberRegistry;
pub use response::{AcceptsTurboStream, TurboFrame, TurboStream};
pub use script::ScriptSource;
pub use server::{build_router, start, ServerError, ServerHandle, Turbo, TurboBuilder};
