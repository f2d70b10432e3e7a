pub mod errors;
pub mod ids;
pub mod negotiate;
pub mod stream;

pub use errors::TurboError;
pub use ids::{ConnectionId, SubscriberId};
pub use negotiate::{prefers_stream_format, STREAM_MIME_TYPE};
pub use stream::{Action, Instruction, Payload};
