//! FitCoach - terminal fitness coach
//!
//! FitCoach generates weekly training schedules and workout plans with an LLM,
//! keeps a chat conversation with a coaching persona, and tracks the user's
//! goal, current workout and progress through a hosted backend.
//!
//! # Modules
//!
//! - [`schedule`] - Schedule formatting, day-card store and fetch lifecycle
//! - [`chat`] - Chat transcript, send lifecycle and terminal REPL
//! - [`coach`] - The generation collaborator and its LLM implementation
//! - [`llm`] - LLM client trait with Gemini, OpenAI and Anthropic clients
//! - [`prompts`] - Prompt templates with on-disk overrides
//! - [`session`] - Signed-in session context
//! - [`dashboard`] - Goal, current plan and progress
//! - [`tui`] - Terminal user interface
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod chat;
pub mod cli;
pub mod coach;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod llm;
pub mod prompts;
pub mod schedule;
pub mod session;
pub mod tui;

// Re-export commonly used types
pub use coach::{Coach, GenerationError, LlmCoach};
pub use config::{Config, LlmConfig};
pub use domain::{ChatMessage, DayRecord, FitnessLevel, TrainingType, WorkoutPlan};
pub use llm::{LlmClient, LlmError, create_client};
pub use session::SessionContext;
