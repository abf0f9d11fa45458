mod core;
mod error;
mod image;
mod sse;

pub use self::core::{FragmentStream, Message, OpenAiClient, Role};
pub use error::OpenAiError;

#[cfg(test)]
pub(crate) use self::core::tests::test_client;
