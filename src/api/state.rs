use std::sync::Arc;

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;

use super::templates::{self, Page};
use crate::ai::chat::SessionStore;
use crate::core::AppConfig;
use crate::openai::OpenAiClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub client: OpenAiClient,
    pub sessions: SessionStore,
    pub templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = OpenAiClient::new(&config);
        let sessions = SessionStore::new(
            &config.system_message,
            config.max_turns,
            config.max_sessions,
        );
        Ok(Self {
            client,
            sessions,
            templates: templates::templates()?,
            config,
        })
    }
}

impl AppState {
    pub fn render<T: Serialize>(&self, page: Page, data: &T) -> Result<String> {
        self.templates
            .render(&page.to_string(), data)
            .with_context(|| format!("Failed to render {} page", page))
    }
}
