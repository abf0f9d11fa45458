//! Page and WebSocket routes

pub mod chat;
pub mod image;

use axum::Router;

use crate::api::state::SharedState;

/// Create the combined router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Chat page, form submission and streaming socket
        .merge(chat::router())
        // Image generation form
        .merge(image::router())
}
