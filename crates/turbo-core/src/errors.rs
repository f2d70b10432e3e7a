/// Errors raised by the instruction vocabulary.
///
/// These are programming errors: the action set is closed and never comes
/// from end users.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TurboError {
    #[error("unknown turbo-stream action: {0:?}")]
    UnknownAction(String),
}
