//! Generation collaborator
//!
//! Everything the app asks of the language model goes through [`Coach`]:
//! weekly schedules, workout plans and chat replies. Responses are free text;
//! callers decide how to split them.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{FitnessLevel, TrainingType};
use crate::llm::{LlmError, Role};

mod llm_coach;
mod scripted;

pub use llm_coach::LlmCoach;
pub use scripted::{CoachCall, ScriptedCoach};

/// Errors from a generation call
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// Produces free-text coaching content
#[async_trait]
pub trait Coach: Send + Sync {
    /// A 7-day schedule for `training_type`, one `Day N:` section per day
    async fn generate_weekly_schedule(&self, training_type: TrainingType) -> Result<String, GenerationError>;

    /// A workout plan focused on `goal`
    async fn generate_workout_plan(&self, goal: &str, level: FitnessLevel) -> Result<String, GenerationError>;

    /// Reply to `message` given the prior transcript as `User: `/`Assistant: ` lines
    async fn chat_response(&self, message: &str, history: &[String]) -> Result<String, GenerationError>;
}

/// Split a serialized transcript line back into role and content
///
/// Lines starting with `User: ` are the user's; anything else is treated as
/// the assistant's. Content is everything after the first `": "`.
pub fn parse_history_line(line: &str) -> (Role, String) {
    let role = if line.starts_with("User: ") {
        Role::User
    } else {
        Role::Assistant
    };
    let content = match line.find(": ") {
        Some(idx) => &line[idx + 2..],
        None => line,
    };
    (role, content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_line() {
        assert_eq!(
            parse_history_line("User: How many sets?"),
            (Role::User, "How many sets?".to_string())
        );
    }

    #[test]
    fn test_parse_assistant_line() {
        assert_eq!(
            parse_history_line("Assistant: Three sets of ten."),
            (Role::Assistant, "Three sets of ten.".to_string())
        );
    }

    #[test]
    fn test_content_containing_separator() {
        assert_eq!(
            parse_history_line("User: Note: rest 90s: then repeat"),
            (Role::User, "Note: rest 90s: then repeat".to_string())
        );
    }

    #[test]
    fn test_unknown_prefix_is_assistant() {
        assert_eq!(parse_history_line("Coach: hi"), (Role::Assistant, "hi".to_string()));
        assert_eq!(parse_history_line("no separator"), (Role::Assistant, "no separator".to_string()));
    }

    #[test]
    fn test_generation_error_from_llm() {
        let err: GenerationError = LlmError::Malformed("bad".to_string()).into();
        assert!(matches!(err, GenerationError::Llm(_)));
        assert!(err.to_string().contains("bad"));
    }
}
