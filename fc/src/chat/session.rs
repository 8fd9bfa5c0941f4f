//! Chat transcript and send lifecycle

use tracing::{debug, warn};

use crate::coach::{Coach, GenerationError};
use crate::domain::ChatMessage;

/// A user turn waiting for the assistant's reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    /// The text just sent
    pub message: String,
    /// Transcript before this turn, as `User: `/`Assistant: ` lines
    pub history: Vec<String>,
}

/// Append-only chat transcript
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    loading: bool,
    last_error: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user message and return the turn to send
    ///
    /// Returns `None` without touching anything for blank input, or while a
    /// reply is still pending.
    pub fn begin_send(&mut self, text: &str) -> Option<ChatTurn> {
        if text.trim().is_empty() {
            debug!("ChatSession::begin_send: blank input ignored");
            return None;
        }
        if self.loading {
            debug!("ChatSession::begin_send: reply pending, input ignored");
            return None;
        }

        let history = self.history();
        self.messages.push(ChatMessage::user(text));
        self.loading = true;
        self.last_error = None;
        debug!(history_len = history.len(), "ChatSession::begin_send: turn started");
        Some(ChatTurn {
            message: text.to_string(),
            history,
        })
    }

    /// Apply the assistant's reply, or record the failure
    pub fn complete_send(&mut self, result: Result<String, GenerationError>) {
        self.loading = false;
        match result {
            Ok(reply) => {
                debug!(reply_len = reply.len(), "ChatSession::complete_send: reply received");
                self.messages.push(ChatMessage::assistant(reply));
            }
            Err(e) => {
                warn!(error = %e, "Chat reply failed");
                self.last_error = Some(format!("Assistant unavailable: {}", e));
            }
        }
    }

    /// Send a message and wait for the reply
    pub async fn send_message(&mut self, coach: &dyn Coach, text: &str) {
        let Some(turn) = self.begin_send(text) else {
            return;
        };
        let result = coach.chat_response(&turn.message, &turn.history).await;
        self.complete_send(result);
    }

    /// Transcript as `User: `/`Assistant: ` lines, oldest first
    pub fn history(&self) -> Vec<String> {
        self.messages.iter().map(ChatMessage::history_line).collect()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Error from the most recent failed reply; cleared by the next send
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start a fresh conversation
    pub fn clear(&mut self) {
        debug!("ChatSession::clear: called");
        self.messages.clear();
        self.last_error = None;
    }
}
