mod core;
mod error;
mod models;
mod session;

pub use self::core::{chat, chat_stream};
pub use error::{RelayError, RelayResult};
pub use models::{DisplayLog, Session, Transcript};
pub use session::{SessionStore, SharedSession};
