//! OpenAI-compatible reply generation

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client as OpenAIClient,
};
use async_trait::async_trait;

use call_agent_config::LlmConfig;
use call_agent_core::{Message, ReplyGenerator, Result, Role};

use crate::LlmError;

/// Reply generator backed by an OpenAI-compatible chat completion API
pub struct OpenAiReplyGenerator {
    client: OpenAIClient<OpenAIConfig>,
    config: LlmConfig,
}

impl OpenAiReplyGenerator {
    /// Build a generator from configuration.
    ///
    /// The API key falls back to the OPENAI_API_KEY environment variable
    /// when not configured explicitly.
    pub fn new(config: LlmConfig) -> Self {
        let mut api_config = OpenAIConfig::new();
        if let Some(key) = &config.api_key {
            api_config = api_config.with_api_key(key.clone());
        }
        if let Some(base) = &config.api_base {
            api_config = api_config.with_api_base(base.clone());
        }

        Self {
            client: OpenAIClient::with_config(api_config),
            config,
        }
    }

    fn convert_history(&self, history: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);

        if let Some(system_prompt) = &self.config.system_prompt {
            if let Ok(msg) = ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt.clone())
                .build()
            {
                messages.push(ChatCompletionRequestMessage::System(msg));
            }
        }

        messages.extend(history.iter().filter_map(|msg| match msg.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(msg.content.clone())
                .build()
                .ok()
                .map(ChatCompletionRequestMessage::System),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(msg.content.clone())
                .build()
                .ok()
                .map(ChatCompletionRequestMessage::User),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(msg.content.clone())
                .build()
                .ok()
                .map(ChatCompletionRequestMessage::Assistant),
        }));

        messages
    }
}

#[async_trait]
impl ReplyGenerator for OpenAiReplyGenerator {
    async fn generate(&self, history: &[Message]) -> Result<Message> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .messages(self.convert_history(history))
            .build()
            .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Backend(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyCompletion)?;

        tracing::debug!(
            model = %self.config.model,
            history_len = history.len(),
            "Generated reply"
        );

        Ok(Message::assistant(content))
    }
}
