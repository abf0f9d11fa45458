//! Router for the image generation page

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::SharedState;
use crate::api::templates::Page;

async fn image_page(State(state): State<SharedState>) -> Result<Html<String>, ApiError> {
    let page = state.render(Page::Image, &public::ImagePage::default())?;
    Ok(Html(page))
}

/// Generate an image from the submitted prompt
async fn create_image(
    State(state): State<SharedState>,
    Form(form): Form<public::ImageForm>,
) -> Result<Response, ApiError> {
    let prompt = form.user_input;
    let (status, page) = match state.client.generate_image(&prompt).await {
        Ok(image_url) => (
            StatusCode::OK,
            public::ImagePage {
                prompt: Some(prompt),
                image_url: Some(image_url),
                error: None,
            },
        ),
        Err(e) => {
            tracing::error!("Image generation failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                public::ImagePage {
                    prompt: Some(prompt),
                    image_url: None,
                    error: Some(format!("Something went wrong: {}", e)),
                },
            )
        }
    };

    let page = state.render(Page::Image, &page)?;
    Ok((status, Html(page)).into_response())
}

/// Create the image router
pub fn router() -> Router<SharedState> {
    Router::new().route("/image", get(image_page).post(create_image))
}
