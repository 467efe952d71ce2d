//! Chat model access
//!
//! Agents only need one thing from a model: given a system prompt and a user
//! prompt, produce text. [`OpenAiChatClient`] adapts any siumai
//! [`ChatCapability`] to that shape; the default build targets an
//! OpenAI-compatible endpoint configured through `OPENAI_API_BASE`,
//! `OPENAI_MODEL_NAME` and `OPENAI_API_KEY`.

use async_trait::async_trait;
use niche_core::{
    require_env, with_timeout, ErrorContext, LlmConfig, NicheError, NicheResult,
    OPENAI_API_KEY_ENV,
};
use siumai::prelude::*;
use tracing::{debug, info};

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier used in logs and errors
    fn model_name(&self) -> &str;

    async fn complete(&self, system: &str, user: &str) -> NicheResult<String>;
}

/// Chat client backed by siumai
pub struct OpenAiChatClient {
    client: Box<dyn ChatCapability + Send + Sync>,
    model: String,
    timeout_ms: u64,
}

impl OpenAiChatClient {
    /// Create a client with the key from `OPENAI_API_KEY`
    pub async fn new(settings: &LlmConfig) -> NicheResult<Self> {
        let api_key = require_env(OPENAI_API_KEY_ENV, "llm")?;
        Self::with_api_key(settings, &api_key).await
    }

    pub async fn with_api_key(settings: &LlmConfig, api_key: &str) -> NicheResult<Self> {
        let mut builder = LlmBuilder::new()
            .openai()
            .api_key(api_key)
            .model(&settings.model)
            .temperature(settings.temperature)
            .base_url(&settings.base_url);

        if let Some(max_tokens) = settings.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        let client = builder.build().await.map_err(|e| NicheError::Config {
            message: format!("Failed to build chat client: {}", e),
            source: None,
            context: ErrorContext::new("llm")
                .with_operation("build_client")
                .with_metadata("base_url", &settings.base_url),
        })?;

        info!(
            "Created chat client: model={}, endpoint={}",
            settings.model, settings.base_url
        );

        Ok(Self::from_client(Box::new(client), settings))
    }

    /// Wrap an already built siumai client
    pub fn from_client(
        client: Box<dyn ChatCapability + Send + Sync>,
        settings: &LlmConfig,
    ) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            timeout_ms: settings.timeout_seconds.saturating_mul(1000),
        }
    }

    fn llm_error(&self, message: String, operation: &str) -> NicheError {
        NicheError::Llm {
            message,
            model: Some(self.model.clone()),
            context: ErrorContext::new("llm").with_operation(operation),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> NicheResult<String> {
        let messages = vec![
            ChatMessage::system(system).build(),
            ChatMessage::user(user).build(),
        ];

        let response = with_timeout(
            self.client.chat_with_tools(messages, None),
            self.timeout_ms,
            "chat_completion",
        )
        .await?
        .map_err(|e| self.llm_error(format!("Chat request failed: {}", e), "chat"))?;

        let content = extract_content(&response).ok_or_else(|| {
            self.llm_error("Chat response contained no message content".to_string(), "decode")
        })?;

        debug!(model = %self.model, chars = content.len(), "Chat completion received");
        Ok(content)
    }
}

fn extract_content(response: &ChatResponse) -> Option<String> {
    response
        .content_text()
        .map(str::trim_end)
        .filter(|content| !content.trim().is_empty())
        .map(str::to_string)
}
