//! Public types for the image routes
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ImageForm {
    pub user_input: String,
}

#[derive(Serialize, Default)]
pub struct ImagePage {
    pub prompt: Option<String>,
    pub image_url: Option<String>,
    pub error: Option<String>,
}
