use std::time::Duration;

use serde_json::{Value, json};

use super::OpenAiError;
use super::core::{OpenAiClient, send};

const IMAGE_TIMEOUT: Duration = Duration::from_secs(60 * 2);

impl OpenAiClient {
    /// Generate a single image for `prompt` and return its URL.
    pub async fn generate_image(&self, prompt: &str) -> Result<String, OpenAiError> {
        let payload = json!({
            "prompt": prompt,
            "n": 1,
            "size": self.image_size,
        });
        let request = self
            .post("/v1/images/generations")
            .timeout(IMAGE_TIMEOUT)
            .json(&payload);
        let response: Value = send(request).await?.json().await?;

        response["data"][0]["url"]
            .as_str()
            .map(String::from)
            .ok_or(OpenAiError::MissingContent)
    }
}
