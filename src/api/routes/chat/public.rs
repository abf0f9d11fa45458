//! Public types for the chat routes
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ChatForm {
    pub user_input: String,
}

#[derive(Serialize)]
pub struct ChatPage {
    pub chat_responses: Vec<String>,
    pub error: Option<String>,
}
