//! Interactive chat REPL

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use super::ChatSession;
use crate::coach::Coach;

/// Result of a slash command
#[derive(Debug, PartialEq, Eq)]
enum SlashResult {
    Continue,
    Quit,
}

/// Add a line to readline history; returns false if it was skipped or failed
fn remember(rl: &mut DefaultEditor, input: &str) -> bool {
    match rl.add_history_entry(input) {
        Ok(added) => added,
        Err(e) => {
            debug!(error = %e, "remember: history entry not saved");
            false
        }
    }
}

/// Line-based chat with the coach
pub struct ChatRepl {
    coach: Arc<dyn Coach>,
    session: ChatSession,
}

impl ChatRepl {
    pub fn new(coach: Arc<dyn Coach>) -> Self {
        Self {
            coach,
            session: ChatSession::new(),
        }
    }

    /// Run the REPL main loop until `/quit` or Ctrl+D
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            match rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    remember(&mut rl, input);

                    if input.starts_with('/') {
                        if self.handle_slash_command(input) == SlashResult::Quit {
                            break;
                        }
                    } else {
                        self.send(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Keep moving!");
        Ok(())
    }

    async fn send(&mut self, input: &str) {
        debug!("ChatRepl::send: called");
        println!("{}", "Coach is typing...".dimmed());
        self.session.send_message(self.coach.as_ref(), input).await;

        if let Some(error) = self.session.last_error() {
            println!("{} {}", "!".red(), error.red());
            return;
        }
        if let Some(reply) = self.session.messages().last().filter(|m| !m.is_user) {
            println!();
            println!("{} {}", reply.time_label().dimmed(), "Coach".bright_blue().bold());
            println!("{}", reply.text);
            println!();
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "FitCoach Assistant".bright_cyan().bold());
        println!("Ask about exercises, technique, recovery or your plan.");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let cmd = input.split_whitespace().next().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/clear" | "/c" => {
                self.session.clear();
                println!("{}", "Conversation cleared.".dimmed());
                SlashResult::Continue
            }
            "/history" => {
                self.print_history();
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the chat", "/quit".yellow());
        println!("  {:14} Start a new conversation", "/clear".yellow());
        println!("  {:14} Show the conversation so far", "/history".yellow());
        println!();
    }

    fn print_history(&self) {
        let messages = self.session.messages();
        if messages.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        for msg in messages {
            let who = if msg.is_user {
                "You".bright_green()
            } else {
                "Coach".bright_blue()
            };
            let preview: String = msg.text.chars().take(60).collect();
            let ellipsis = if msg.text.chars().count() > 60 { "..." } else { "" };
            println!("  {} {:6} {}{}", msg.time_label().dimmed(), who, preview, ellipsis);
        }
        println!();
    }
}
