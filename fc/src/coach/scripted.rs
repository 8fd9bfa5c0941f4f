//! Canned coach for tests and offline demos

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use super::{Coach, GenerationError};
use crate::domain::{FitnessLevel, TrainingType};

/// A recorded call to a [`ScriptedCoach`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoachCall {
    Schedule(TrainingType),
    Plan { goal: String, level: FitnessLevel },
    Chat { message: String, history: Vec<String> },
}

/// Coach that replays queued replies in order
///
/// `Ok` entries are returned as text, `Err` entries as
/// [`GenerationError::EmptyResponse`]. Once the queue is empty every call
/// fails.
#[derive(Debug, Default)]
pub struct ScriptedCoach {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<CoachCall>>,
}

impl ScriptedCoach {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure
    pub fn fail(self, reason: impl Into<String>) -> Self {
        self.push(Err(reason.into()));
        self
    }

    pub fn push(&self, reply: Result<String, String>) {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).push_back(reply);
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<CoachCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next(&self, call: CoachCall) -> Result<String, GenerationError> {
        debug!(?call, "ScriptedCoach::next: called");
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
        match self.replies.lock().unwrap_or_else(|e| e.into_inner()).pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => {
                debug!(%reason, "ScriptedCoach::next: scripted failure");
                Err(GenerationError::EmptyResponse)
            }
            None => Err(GenerationError::Prompt("no scripted reply left".to_string())),
        }
    }
}

#[async_trait]
impl Coach for ScriptedCoach {
    async fn generate_weekly_schedule(&self, training_type: TrainingType) -> Result<String, GenerationError> {
        self.next(CoachCall::Schedule(training_type))
    }

    async fn generate_workout_plan(&self, goal: &str, level: FitnessLevel) -> Result<String, GenerationError> {
        self.next(CoachCall::Plan {
            goal: goal.to_string(),
            level,
        })
    }

    async fn chat_response(&self, message: &str, history: &[String]) -> Result<String, GenerationError> {
        self.next(CoachCall::Chat {
            message: message.to_string(),
            history: history.to_vec(),
        })
    }
}
