use thiserror::Error;

use crate::openai::OpenAiError;

pub type RelayResult<T> = Result<T, RelayError>;

/// Why a chat turn did not produce a reply.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Upstream(#[from] OpenAiError),

    /// The receiving end went away before the reply was complete.
    #[error("Client disconnected before the reply completed")]
    Disconnected,
}
