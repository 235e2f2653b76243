//! Prompt-library backed generation over an LLM client

use super::prompts::{PromptId, PromptLibrary, PromptVars};
use super::{ChatMessage, Generator, LLMClient};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// [`Generator`] that renders a template and sends it as a single user turn
pub struct LlmGenerator {
    client: Arc<dyn LLMClient>,
    prompts: PromptLibrary,
}

impl LlmGenerator {
    pub fn new(client: Arc<dyn LLMClient>, prompts: PromptLibrary) -> Self {
        Self { client, prompts }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, prompt: PromptId, vars: &PromptVars) -> Result<String> {
        let rendered = self.prompts.render(prompt, vars);
        tracing::debug!("Generating with prompt {} ({} chars)", prompt, rendered.len());

        let messages = vec![
            ChatMessage::system("Responda sempre em português e SOMENTE com um objeto JSON válido."),
            ChatMessage::user(rendered),
        ];
        let output = self.client.chat_completion(messages).await?;

        tracing::debug!("Raw output for {}: {}", prompt, output);
        Ok(output)
    }
}
