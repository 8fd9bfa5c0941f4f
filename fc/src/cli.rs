//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::domain::{FitnessLevel, TrainingType};

/// FitCoach - terminal fitness coach
#[derive(Parser)]
#[command(
    name = "fc",
    about = "Terminal fitness coach with AI-generated schedules, plans and chat",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Use an in-memory backend with a demo user instead of the hosted one
    #[arg(long, global = true)]
    pub offline: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default)
    Tui,

    /// Sign in and remember the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Signup {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out and forget the saved session
    Logout,

    /// Generate and print a weekly schedule
    Schedule {
        /// Training type (strength, cardio, flexibility)
        #[arg(value_name = "TYPE")]
        training_type: TrainingType,

        /// Print each day's details, not just the labels
        #[arg(short, long)]
        expand: bool,
    },

    /// Set a training goal and generate a workout plan for it
    Plan {
        /// Goal (strength, cardio, flexibility)
        #[arg(value_name = "GOAL")]
        goal: TrainingType,

        /// Fitness level for a standalone plan (beginner, intermediate, advanced)
        #[arg(short = 'L', long)]
        level: Option<FitnessLevel>,
    },

    /// Chat with the coach in the terminal
    Chat,

    /// Show configuration, session and provider status
    Status,
}

/// Result of checking a required environment variable
pub struct EnvCheck {
    pub name: String,
    pub present: bool,
}

impl EnvCheck {
    pub fn check(name: impl Into<String>) -> Self {
        let name = name.into();
        let present = std::env::var(&name).map(|v| !v.is_empty()).unwrap_or(false);
        debug!(%name, present, "EnvCheck::check: called");
        Self { name, present }
    }
}

/// Check the environment variables the given config needs
pub fn check_required_env(config: &Config) -> Vec<EnvCheck> {
    vec![
        EnvCheck::check(config.llm.api_key_env()),
        EnvCheck::check(&config.backend.url_env),
        EnvCheck::check(&config.backend.anon_key_env),
    ]
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fitcoach")
        .join("logs")
        .join("fitcoach.log")
}

/// Generate the after_help text with environment checks
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let checks = check_required_env(&Config::default());

    let mut help = String::from("Environment:\n");
    for check in &checks {
        let icon = if check.present { "\u{2705}" } else { "\u{274C}" };
        let status = if check.present { "set" } else { "not set" };
        help.push_str(&format!("  {} {:<20} {}\n", icon, check.name, status));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}
