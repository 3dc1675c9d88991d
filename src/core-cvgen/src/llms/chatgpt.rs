use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        ResponseFormat,
    },
};
use async_trait::async_trait;

use crate::{GenerationError, llms::LlmProvider};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a career assistant that writes tailored job application material. \
                             You always answer with a single JSON object.";

/// ChatGPT over the OpenAI chat completions API.
///
/// The client reads `OPENAI_API_KEY` (and optionally `OPENAI_BASE_URL`) from the environment.
pub struct ChatGpt {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ChatGpt {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
        }
    }

    /// Uses `OPENAI_MODEL` when set, otherwise `DEFAULT_MODEL`.
    pub fn from_env() -> Self {
        let model = std::env::var("OPENAI_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self::new(model)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for ChatGpt {
    async fn complete_prompt(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .response_format(ResponseFormat::JsonObject)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        tracing::debug!("Sending {} character prompt to {}", prompt.len(), self.model);
        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_model_overrides_model() {
        let chatgpt = ChatGpt::new(DEFAULT_MODEL).with_model("gpt-4o");
        assert_eq!(chatgpt.model(), "gpt-4o");
    }

    #[cfg(has_openai_key)]
    #[tokio::test]
    async fn test_complete_prompt_live() {
        let chatgpt = ChatGpt::from_env();
        let response = chatgpt
            .complete_prompt("Reply with the JSON object {\"ok\": true} and nothing else.")
            .await
            .unwrap();
        println!("ChatGPT response: {}", response);
        assert!(response.contains("ok"));
    }
}
