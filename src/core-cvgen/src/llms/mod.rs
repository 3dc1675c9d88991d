pub mod chatgpt;
pub mod prompts;

use async_trait::async_trait;

pub use chatgpt::ChatGpt;
pub use prompts::prompt_generate_application;

use crate::GenerationError;

/// Interface to a hosted LLM that lets us complete a prompt and await a response.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete_prompt(&self, prompt: &str) -> Result<String, GenerationError>;
}
