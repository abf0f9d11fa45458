//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::ai::chat::RelayError;
use crate::openai::OpenAiError;

// Errors

pub struct ApiError(anyhow::Error);

impl ApiError {
    // Errors from the LLM API surface as a bad gateway
    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<RelayError>().is_some()
            || self.0.downcast_ref::<OpenAiError>().is_some()
        {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("{:#}", self.0);

        (self.status(), format!("Something went wrong: {}", self.0)).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Re-export public types from each route

pub mod chat {
    pub use crate::api::routes::chat::public::*;
}

pub mod image {
    pub use crate::api::routes::image::public::*;
}
