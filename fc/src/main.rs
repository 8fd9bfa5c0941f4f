//! FitCoach - terminal fitness coach
//!
//! CLI entry point: the dashboard TUI, account commands and one-shot
//! schedule/plan generation.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use eyre::{Context, Result};
use tracing::{debug, info};

use fitcoach::chat::ChatRepl;
use fitcoach::cli::{Cli, Command, check_required_env, generate_after_help, get_log_path};
use fitcoach::coach::{Coach, LlmCoach};
use fitcoach::config::Config;
use fitcoach::dashboard::Dashboard;
use fitcoach::domain::{FitnessLevel, TrainingType};
use fitcoach::llm::{LlmClient, create_client};
use fitcoach::prompts::PromptLoader;
use fitcoach::schedule::{ScheduleGenerator, split_plan_lines};
use fitcoach::session::{SessionContext, load_session_file};
use fitcoach::tui;
use fitstore::{Backend, MemoryBackend, RestBackend};

/// Demo account used in offline mode
const DEMO_EMAIL: &str = "demo@fitcoach.local";
const DEMO_PASSWORD: &str = "demo";

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, offline = cli.offline, "FitCoach loaded config");

    let offline = cli.offline;
    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Tui) => cmd_tui(&config, offline).await,
        Some(Command::Login { email, password }) => cmd_login(&config, offline, &email, password, false).await,
        Some(Command::Signup { email, password }) => cmd_login(&config, offline, &email, password, true).await,
        Some(Command::Logout) => cmd_logout(&config, offline).await,
        Some(Command::Schedule { training_type, expand }) => cmd_schedule(&config, training_type, expand).await,
        Some(Command::Plan { goal, level }) => cmd_plan(&config, offline, goal, level).await,
        Some(Command::Chat) => cmd_chat(&config).await,
        Some(Command::Status) => cmd_status(&config, offline),
    }
}

/// Hosted backend, or an in-memory one with the demo account when offline
fn build_backend(config: &Config, offline: bool) -> Result<Arc<dyn Backend>> {
    if offline {
        debug!("build_backend: offline, using MemoryBackend");
        return Ok(Arc::new(MemoryBackend::with_account(DEMO_EMAIL, DEMO_PASSWORD)));
    }
    let url = config.backend.url()?;
    let anon_key = config.backend.anon_key()?;
    let timeout = Duration::from_millis(config.backend.timeout_ms);
    let backend = RestBackend::new(url, anon_key, timeout).context("Failed to create backend client")?;
    Ok(Arc::new(backend))
}

/// Session context: the saved session when online, the demo user when offline
async fn build_session(config: &Config, offline: bool) -> Result<Arc<SessionContext>> {
    let backend = build_backend(config, offline)?;
    if offline {
        let ctx = SessionContext::new(backend, None);
        ctx.sign_in(DEMO_EMAIL, DEMO_PASSWORD)
            .await
            .context("Failed to sign in the demo user")?;
        return Ok(Arc::new(ctx));
    }
    let ctx = SessionContext::restore(backend, config.storage.session_file.clone()).await;
    Ok(Arc::new(ctx))
}

fn build_coach(config: &Config) -> Result<Arc<dyn Coach>> {
    let client = create_client(&config.llm).context("Failed to create LLM client")?;
    info!(provider = client.provider(), model = client.model(), "LLM client ready");
    let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let coach = LlmCoach::new(
        client,
        PromptLoader::new(root),
        config.llm.max_tokens,
        config.llm.chat_max_tokens,
    );
    Ok(Arc::new(coach))
}

async fn cmd_tui(config: &Config, offline: bool) -> Result<()> {
    debug!(offline, "cmd_tui: called");
    config.validate(offline)?;
    let session = build_session(config, offline).await?;
    if !session.is_signed_in() {
        eyre::bail!("Not signed in. Run `fc login --email <EMAIL>` first, or use --offline.");
    }
    let coach = build_coach(config)?;
    tui::run(coach, session, offline).await
}

async fn cmd_login(config: &Config, offline: bool, email: &str, password: Option<String>, signup: bool) -> Result<()> {
    debug!(%email, signup, "cmd_login: called");
    let backend = build_backend(config, offline)?;
    let session_file = (!offline).then(|| config.storage.session_file.clone());
    let ctx = SessionContext::new(backend, session_file);

    let password = match password {
        Some(p) => p,
        None => read_password("Password: ")?,
    };

    let result = if signup {
        ctx.sign_up(email, &password).await
    } else {
        ctx.sign_in(email, &password).await
    };
    let session = result.map_err(|e| eyre::eyre!("{}", e))?;

    let who = session.user.email.as_deref().unwrap_or(email);
    println!("{} Signed in as {}", "✓".green(), who.bold());
    Ok(())
}

async fn cmd_logout(config: &Config, offline: bool) -> Result<()> {
    debug!("cmd_logout: called");
    let session = build_session(config, offline).await?;
    if !session.is_signed_in() {
        println!("Not signed in");
        return Ok(());
    }
    session.sign_out().await;
    println!("{} Signed out", "✓".green());
    Ok(())
}

async fn cmd_schedule(config: &Config, training_type: TrainingType, expand: bool) -> Result<()> {
    debug!(%training_type, expand, "cmd_schedule: called");
    config.validate(true)?;
    let coach = build_coach(config)?;

    println!("Generating your {} schedule...", training_type.as_str().cyan());
    let mut generator = ScheduleGenerator::new();
    generator.fetch_schedule(coach.as_ref(), training_type).await;
    if let Some(error) = generator.error() {
        eyre::bail!("{}", error);
    }

    println!();
    println!("{}", format!("{} Training", training_type.title()).bold());
    println!("{}", training_type.description().dimmed());
    println!();
    for day in generator.store().days() {
        println!("{}", day.label.bright_cyan().bold());
        if expand {
            for line in day.content.lines() {
                println!("    {}", line);
            }
            println!();
        }
    }
    Ok(())
}

async fn cmd_plan(config: &Config, offline: bool, goal: TrainingType, level: Option<FitnessLevel>) -> Result<()> {
    debug!(%goal, ?level, "cmd_plan: called");
    config.validate(true)?;
    let coach = build_coach(config)?;

    // An explicit level asks for a plan only; nothing is recorded
    if let Some(level) = level {
        let text = coach
            .generate_workout_plan(goal.as_str(), level)
            .await
            .map_err(|e| eyre::eyre!("Failed to generate plan: {}", e))?;
        println!("{}", format!("{} plan ({})", goal.title(), level).bold());
        for exercise in split_plan_lines(&text) {
            println!("  • {}", exercise);
        }
        return Ok(());
    }

    let session = build_session(config, offline).await?;
    let current = session.current();
    if current.is_none() {
        eyre::bail!("Not signed in. Run `fc login --email <EMAIL>` first, or use --offline.");
    }

    let mut dashboard = Dashboard::new();
    dashboard
        .change_goal(goal, coach.as_ref(), session.backend().as_ref(), current.as_ref())
        .await;
    let Some(plan) = dashboard.workout_plan else {
        eyre::bail!("Could not create a plan. See {} for details.", get_log_path().display());
    };

    println!("{} Goal set to {}", "✓".green(), goal.title().bold());
    println!();
    println!("{}", plan.name.bold());
    println!("{}", format!("{} · {}", plan.duration, plan.intensity).dimmed());
    for exercise in &plan.exercises {
        println!("  • {}", exercise);
    }
    Ok(())
}

async fn cmd_chat(config: &Config) -> Result<()> {
    debug!("cmd_chat: called");
    config.validate(true)?;
    let coach = build_coach(config)?;
    ChatRepl::new(coach).run().await
}

/// Print config, environment and saved-session status; makes no network calls
fn cmd_status(config: &Config, offline: bool) -> Result<()> {
    debug!(offline, "cmd_status: called");
    println!("{}", "FitCoach".bold());
    println!("  Version:  {}", env!("CARGO_PKG_VERSION"));
    println!("  Provider: {} ({})", config.llm.provider, config.llm.model);
    println!("  Endpoint: {}", config.llm.base_url());
    println!();

    println!("{}", "Environment".bold());
    for check in check_required_env(config) {
        let status = if check.present { "set".green() } else { "not set".red() };
        println!("  {:<20} {}", check.name, status);
    }
    println!();

    println!("{}", "Session".bold());
    if offline {
        println!("  Offline mode, signed in as {}", DEMO_EMAIL);
    } else {
        let path = &config.storage.session_file;
        match load_session_file(path) {
            Some(session) => {
                let who = session.user.email.as_deref().unwrap_or(session.user_id());
                let state = if session.is_expired() {
                    "expired".yellow()
                } else {
                    "active".green()
                };
                println!("  Signed in as {} ({})", who, state);
            }
            None => println!("  Not signed in"),
        }
        println!("  File: {}", path.display());
    }
    println!();
    println!("Logs are written to: {}", get_log_path().display());
    Ok(())
}

/// Read a password from the terminal without echoing it
fn read_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    enable_raw_mode().context("Failed to enable raw mode")?;
    let result = read_password_raw();
    disable_raw_mode().context("Failed to disable raw mode")?;
    println!();
    result
}

fn read_password_raw() -> Result<String> {
    let mut password = String::new();
    loop {
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Enter => return Ok(password),
                KeyCode::Backspace => {
                    password.pop();
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    eyre::bail!("Cancelled");
                }
                KeyCode::Esc => eyre::bail!("Cancelled"),
                KeyCode::Char(c) => password.push(c),
                _ => {}
            }
        }
    }
}
