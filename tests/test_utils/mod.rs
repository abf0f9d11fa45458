//! Test utilities for integration tests
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::sync::Notify;

use chatline::api::{AppState, app};
use chatline::core::AppConfig;

pub const SYSTEM_MESSAGE: &str = "You are a test assistant.";
pub const IMAGE_URL: &str = "https://images.test/generated.png";
pub const STALLED_FRAGMENT: &str = "partial";

/// How the fake completion API behaves
#[derive(Clone, Copy, PartialEq)]
pub enum Upstream {
    Echo,
    Failing,
}

/// The reply the fake API gives for a conversation. It lists every
/// user message it was sent so tests can tell which context a reply
/// was conditioned on.
pub fn echo_reply(user_messages: &[&str]) -> String {
    format!("echo: {}", user_messages.join(" | "))
}

fn reply_for(payload: &Value) -> Result<String, String> {
    let messages = payload["messages"]
        .as_array()
        .ok_or_else(|| "missing messages".to_string())?;
    let first = messages.first().ok_or_else(|| "no messages".to_string())?;
    if first["role"] != "system" || first["content"] != SYSTEM_MESSAGE {
        return Err("first message must be the system message".to_string());
    }
    let user_messages: Vec<&str> = messages
        .iter()
        .filter(|m| m["role"] == "user")
        .filter_map(|m| m["content"].as_str())
        .collect();
    Ok(echo_reply(&user_messages))
}

async fn fake_completions(State(mode): State<Upstream>, Json(payload): Json<Value>) -> Response {
    if mode == Upstream::Failing {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"message": "The server is overloaded"}})),
        )
            .into_response();
    }

    let reply = match reply_for(&payload) {
        Ok(reply) => reply,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": {"message": message}})))
                .into_response();
        }
    };

    if payload["stream"] != json!(true) {
        return Json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": reply},
                "finish_reason": "stop"
            }]
        }))
        .into_response();
    }

    // One event per word, the first one only carries the role
    let mut body = String::from(
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
    );
    for word in reply.split_inclusive(' ') {
        let chunk = json!({
            "choices": [{"index": 0, "delta": {"content": word}, "finish_reason": null}]
        });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from(body))
        .unwrap()
}

async fn fake_images(State(mode): State<Upstream>, Json(payload): Json<Value>) -> Response {
    if mode == Upstream::Failing || payload["n"] != json!(1) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"message": "Image generation rejected"}})),
        )
            .into_response();
    }
    Json(json!({"created": 1700000000, "data": [{"url": IMAGE_URL}]})).into_response()
}

// Signals once the response body is dropped, i.e. the client hung up
struct NotifyOnDrop(Arc<Notify>);

impl Drop for NotifyOnDrop {
    fn drop(&mut self) {
        self.0.notify_one();
    }
}

// Sends a single fragment then never finishes the reply
async fn stalling_completions(State(closed): State<Arc<Notify>>) -> Response {
    let guard = NotifyOnDrop(closed);
    let body = async_stream::stream! {
        let _guard = guard;
        let chunk = json!({"choices": [{"index": 0, "delta": {"content": STALLED_FRAGMENT}}]});
        yield Ok::<_, std::convert::Infallible>(format!("data: {}\n\n", chunk));
        tokio::time::sleep(Duration::from_secs(30)).await;
        yield Ok(String::from("data: [DONE]\n\n"));
    };

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(body))
        .unwrap()
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Starts a fake OpenAI compatible API and returns its base URL.
pub async fn fake_openai(mode: Upstream) -> String {
    let router = Router::new()
        .route("/v1/chat/completions", post(fake_completions))
        .route("/v1/images/generations", post(fake_images))
        .with_state(mode);
    format!("http://{}", spawn(router).await)
}

/// Serves the test application against an API that stalls after the
/// first fragment. The returned `Notify` fires when the upstream
/// request is dropped.
pub async fn spawn_stalling_app() -> (SocketAddr, Arc<Notify>) {
    let closed = Arc::new(Notify::new());
    let router = Router::new()
        .route("/v1/chat/completions", post(stalling_completions))
        .with_state(Arc::clone(&closed));
    let url = format!("http://{}", spawn(router).await);
    let app_state = AppState::new(test_config(&url)).unwrap();
    (spawn(app(Arc::new(app_state))).await, closed)
}

pub fn test_config(openai_api_hostname: &str) -> AppConfig {
    AppConfig {
        openai_api_hostname: openai_api_hostname.to_string(),
        openai_api_key: String::from("test-api-key"),
        openai_model: String::from("gpt-4o"),
        temperature: 0.6,
        system_message: String::from(SYSTEM_MESSAGE),
        image_size: String::from("512x512"),
        max_turns: 20,
        max_sessions: 100,
    }
}

/// Creates a test application router backed by a fake API.
pub async fn test_app(mode: Upstream) -> Router {
    let url = fake_openai(mode).await;
    let app_state = AppState::new(test_config(&url)).unwrap();
    app(Arc::new(app_state))
}

/// Serves the test application on a random local port.
pub async fn spawn_test_app(mode: Upstream) -> SocketAddr {
    spawn(test_app(mode).await).await
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `name=value` of the session cookie set on a response.
pub fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Missing set-cookie header")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub fn form_body(user_input: &str) -> Body {
    Body::from(format!("user_input={}", encode(user_input)))
}

// Just enough form encoding for test inputs
fn encode(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            ' ' => "+".to_string(),
            c if c.is_ascii_alphanumeric() => c.to_string(),
            c => c
                .to_string()
                .bytes()
                .map(|b| format!("%{:02X}", b))
                .collect(),
        })
        .collect()
}

/// Number of user and assistant entries rendered on the chat page.
pub fn count_entries(html: &str) -> (usize, usize) {
    (
        html.matches(r#"class="entry user""#).count(),
        html.matches(r#"class="entry assistant""#).count(),
    )
}
