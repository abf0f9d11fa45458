//! Router for the chat page

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;

use super::{public, ws};
use crate::ai::chat::chat;
use crate::api::public::ApiError;
use crate::api::state::SharedState;
use crate::api::templates::Page;
use crate::api::utils::ensure_session;

/// Render the chat page with the caller's display log
async fn chat_page(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let (jar, session_id) = ensure_session(jar);

    let chat_responses = match state.sessions.get(&session_id)? {
        Some(session) => {
            let session = session.lock().await;
            session.display_log.entries()
        }
        None => Vec::new(),
    };
    let page = state.render(
        Page::Home,
        &public::ChatPage {
            chat_responses,
            error: None,
        },
    )?;

    Ok((jar, Html(page)))
}

/// Run a chat turn from a form submission and re-render the page
async fn chat_form(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<public::ChatForm>,
) -> Result<Response, ApiError> {
    let (jar, session_id) = ensure_session(jar);
    let session = state.sessions.get_or_create(&session_id)?;
    let mut session = session.lock().await;

    let (status, error) = match chat(&state.client, &mut session, &form.user_input).await {
        Ok(_) => (StatusCode::OK, None),
        Err(e) => {
            tracing::error!("Chat turn failed for session {}: {}", session_id, e);
            (StatusCode::BAD_GATEWAY, Some(format!("Something went wrong: {}", e)))
        }
    };

    let page = state.render(
        Page::Home,
        &public::ChatPage {
            chat_responses: session.display_log.entries(),
            error,
        },
    )?;

    Ok((status, jar, Html(page)).into_response())
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(chat_page).post(chat_form))
        .route("/ws", get(ws::ws_handler))
}
