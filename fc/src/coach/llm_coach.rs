//! Coach backed by an LLM client and prompt templates

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Coach, GenerationError, parse_history_line};
use crate::domain::{FitnessLevel, TrainingType};
use crate::llm::{CompletionRequest, LlmClient, Message, Role};
use crate::prompts::{PromptContext, PromptLoader};

pub struct LlmCoach {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    max_tokens: u32,
    chat_max_tokens: u32,
}

impl LlmCoach {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader, max_tokens: u32, chat_max_tokens: u32) -> Self {
        debug!(provider = %llm.provider(), model = %llm.model(), "LlmCoach::new: called");
        Self {
            llm,
            prompts,
            max_tokens,
            chat_max_tokens,
        }
    }

    fn render(&self, name: &str, context: &PromptContext) -> Result<String, GenerationError> {
        self.prompts
            .render(name, context)
            .map_err(|e| GenerationError::Prompt(e.to_string()))
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        let response = self.llm.complete(request).await?;
        debug!(
            stop_reason = ?response.stop_reason,
            tokens = response.usage.total(),
            "LlmCoach::complete: response received"
        );
        match response.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GenerationError::EmptyResponse),
        }
    }

    /// One-shot request: coach persona as system prompt, rendered template as the user turn
    async fn generate(&self, template: &str, context: PromptContext) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            system_prompt: self.render("coach", &PromptContext::default())?,
            messages: vec![Message::user(self.render(template, &context)?)],
            max_tokens: self.max_tokens,
        };
        self.complete(request).await
    }
}

/// Rebuild a message list from history lines plus the new user message
///
/// Consecutive turns from the same role are merged since providers expect
/// alternating roles.
fn build_chat_messages(message: &str, history: &[String]) -> Vec<Message> {
    let mut messages: Vec<Message> = Vec::with_capacity(history.len() + 1);
    let turns = history
        .iter()
        .map(|line| parse_history_line(line))
        .chain(std::iter::once((Role::User, message.to_string())));

    for (role, content) in turns {
        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push('\n');
                last.content.push_str(&content);
            }
            _ => messages.push(Message { role, content }),
        }
    }
    messages
}

#[async_trait]
impl Coach for LlmCoach {
    async fn generate_weekly_schedule(&self, training_type: TrainingType) -> Result<String, GenerationError> {
        info!(%training_type, "Generating weekly schedule");
        self.generate("schedule", PromptContext::schedule(training_type)).await
    }

    async fn generate_workout_plan(&self, goal: &str, level: FitnessLevel) -> Result<String, GenerationError> {
        info!(%goal, %level, "Generating workout plan");
        self.generate("workout", PromptContext::workout(goal, level)).await
    }

    async fn chat_response(&self, message: &str, history: &[String]) -> Result<String, GenerationError> {
        debug!(history_len = history.len(), "LlmCoach::chat_response: called");
        let request = CompletionRequest {
            system_prompt: self.render("chat", &PromptContext::default())?,
            messages: build_chat_messages(message, history),
            max_tokens: self.chat_max_tokens,
        };
        self.complete(request).await
    }
}
