use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};

pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a professional data science assistant. Provide clear, concise, and practical advice. Use minimal formatting and no emojis unless specifically requested. Focus on actionable guidance.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub temperature: f64,
    pub system_message: String,
    pub image_size: String,
    // Number of user/assistant exchanges kept per session
    pub max_turns: usize,
    pub max_sessions: usize,
}

impl AppConfig {
    /// Build the config from the process environment. A `.env` file
    /// in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key =
            lookup("OPENAI_API_KEY").ok_or_else(|| anyhow!("Missing env var OPENAI_API_KEY"))?;
        let openai_api_hostname = lookup("CHATLINE_OPENAI_HOST")
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        let openai_model =
            lookup("CHATLINE_MODEL").unwrap_or_else(|| "chatgpt-4o-latest".to_string());
        let system_message = lookup("CHATLINE_SYSTEM_MESSAGE")
            .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string());
        let image_size = lookup("CHATLINE_IMAGE_SIZE").unwrap_or_else(|| "512x512".to_string());
        let temperature = parse_var(&lookup, "CHATLINE_TEMPERATURE", 0.6)?;
        let max_turns = parse_var(&lookup, "CHATLINE_MAX_TURNS", 50)?;
        let max_sessions = parse_var(&lookup, "CHATLINE_MAX_SESSIONS", 1000)?;

        Ok(Self {
            openai_api_hostname,
            openai_api_key,
            openai_model,
            temperature,
            system_message,
            image_size,
            max_turns,
            max_sessions,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
