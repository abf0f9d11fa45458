use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("Request to OpenAI API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OpenAI API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse OpenAI API response: {0}")]
    Parse(String),

    #[error("OpenAI API response contained no content")]
    MissingContent,
}

impl OpenAiError {
    /// Build an error from a non-2xx response body. OpenAI puts the
    /// reason under `error.message`, other compatible servers may
    /// only return plain text.
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or_else(|| body.trim().to_string());
        Self::Api { status, message }
    }
}
