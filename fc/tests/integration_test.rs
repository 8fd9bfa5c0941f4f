//! Integration tests for FitCoach
//!
//! These tests run the schedule, chat and dashboard flows end to end against
//! the in-memory backend and a scripted coach, and exercise the `fc` binary.

use std::sync::Arc;

use assert_cmd::Command;
use fitcoach::chat::ChatSession;
use fitcoach::coach::{CoachCall, ScriptedCoach};
use fitcoach::dashboard::Dashboard;
use fitcoach::domain::{FitnessLevel, TrainingType};
use fitcoach::schedule::{FetchState, SCHEDULE_ERROR, ScheduleGenerator};
use fitcoach::session::SessionContext;
use fitstore::{Backend, MemoryBackend, WorkoutRecord};
use predicates::prelude::*;
use tempfile::TempDir;

const EMAIL: &str = "alex@example.com";
const PASSWORD: &str = "hunter2";

async fn signed_in(session_file: Option<std::path::PathBuf>) -> (Arc<MemoryBackend>, SessionContext) {
    let backend = Arc::new(MemoryBackend::with_account(EMAIL, PASSWORD));
    let ctx = SessionContext::new(backend.clone(), session_file);
    ctx.sign_in(EMAIL, PASSWORD).await.expect("sign in");
    (backend, ctx)
}

// =============================================================================
// Schedule
// =============================================================================

#[tokio::test]
async fn test_schedule_fetch_expand_and_refetch() {
    let coach = ScriptedCoach::new()
        .reply("Here is your week.\nDay 1: Squats 5x5\nDay 2: Rest\nDay 3: Deadlifts")
        .reply("Day 1: Long run");
    let mut generator = ScheduleGenerator::new();

    generator.fetch_schedule(&coach, TrainingType::Strength).await;
    assert_eq!(generator.state(), FetchState::Ready);
    let labels: Vec<&str> = generator.store().days().iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["Day 0", "Day 1", "Day 2", "Day 3"]);
    assert_eq!(generator.store().days()[1].content, "Squats 5x5");

    generator.toggle(1);
    generator.toggle(-1);
    generator.toggle(99);
    let expanded: Vec<bool> = generator.store().days().iter().map(|d| d.expanded).collect();
    assert_eq!(expanded, vec![false, true, false, false]);

    generator.fetch_schedule(&coach, TrainingType::Cardio).await;
    assert_eq!(generator.store().len(), 1);
    assert!(!generator.store().days()[0].expanded);

    assert_eq!(
        coach.calls(),
        vec![
            CoachCall::Schedule(TrainingType::Strength),
            CoachCall::Schedule(TrainingType::Cardio)
        ]
    );
}

#[tokio::test]
async fn test_schedule_failure_keeps_previous_days() {
    let coach = ScriptedCoach::new().reply("Day 1: Yoga flow").fail("quota exceeded");
    let mut generator = ScheduleGenerator::new();

    generator.fetch_schedule(&coach, TrainingType::Flexibility).await;
    generator.fetch_schedule(&coach, TrainingType::Flexibility).await;

    assert_eq!(generator.state(), FetchState::Error);
    assert_eq!(generator.error(), Some(SCHEDULE_ERROR));
    assert!(!generator.is_loading());
    assert_eq!(generator.store().len(), 1);
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_conversation_carries_history() {
    let coach = ScriptedCoach::new().reply("Start with three sessions a week.").reply("Yes, rest days matter.");
    let mut chat = ChatSession::new();

    chat.send_message(&coach, "How often should I train?").await;
    chat.send_message(&coach, "   ").await;
    chat.send_message(&coach, "Should I rest?").await;

    assert_eq!(chat.messages().len(), 4);
    assert_eq!(
        chat.history(),
        vec![
            "User: How often should I train?",
            "Assistant: Start with three sessions a week.",
            "User: Should I rest?",
            "Assistant: Yes, rest days matter.",
        ]
    );

    let calls = coach.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1],
        CoachCall::Chat {
            message: "Should I rest?".to_string(),
            history: vec![
                "User: How often should I train?".to_string(),
                "Assistant: Start with three sessions a week.".to_string(),
            ],
        }
    );
}

#[tokio::test]
async fn test_chat_failure_keeps_user_message() {
    let coach = ScriptedCoach::new().fail("network down");
    let mut chat = ChatSession::new();

    chat.send_message(&coach, "Hello?").await;

    assert_eq!(chat.messages().len(), 1);
    assert!(chat.messages()[0].is_user);
    assert!(!chat.is_loading());
    assert!(chat.last_error().is_some());
}

// =============================================================================
// Dashboard
// =============================================================================

#[tokio::test]
async fn test_dashboard_goal_change_then_reload() {
    let (backend, ctx) = signed_in(None).await;
    let session = ctx.current();
    let user_id = ctx.user_id().expect("user id");
    backend.add_metric(&user_id, "2026-01-01", 10.0, "progress");
    backend.add_metric(&user_id, "2026-01-02", 12.5, "progress");

    let coach = ScriptedCoach::new().reply("Jumping jacks\n\nIntervals\nCool-down walk\n");
    let mut dashboard = Dashboard::new();
    dashboard
        .change_goal(TrainingType::Cardio, &coach, backend.as_ref(), session.as_ref())
        .await;

    assert_eq!(dashboard.user_goal, TrainingType::Cardio);
    let plan = dashboard.workout_plan.clone().expect("plan");
    assert_eq!(plan.name, "Cardio Training");
    assert_eq!(plan.exercises, vec!["Jumping jacks", "Intervals", "Cool-down walk"]);
    assert_eq!(
        coach.calls(),
        vec![CoachCall::Plan {
            goal: "cardio".to_string(),
            level: FitnessLevel::Intermediate
        }]
    );

    // A fresh dashboard picks the inserted workout back up
    let mut reloaded = Dashboard::new();
    reloaded.load_user_data(backend.as_ref(), session.as_ref()).await;
    let plan = reloaded.workout_plan.as_ref().expect("plan");
    assert_eq!(plan.name, "Cardio Training");
    assert_eq!(plan.duration, "45 minutes");
    assert_eq!(plan.intensity, "Moderate");
    assert_eq!(reloaded.progress_values(), vec![10.0, 12.5]);
    assert_eq!(reloaded.stats.latest_progress, Some(12.5));
}

#[tokio::test]
async fn test_dashboard_ignores_completed_workouts() {
    let (backend, ctx) = signed_in(None).await;
    let user_id = ctx.user_id().expect("user id");
    backend.add_workout(WorkoutRecord {
        id: "w-1".to_string(),
        user_id: user_id.clone(),
        name: "Strength Training".to_string(),
        date: "2026-03-01T08:00:00Z".to_string(),
        completed: true,
        exercises: Some(vec!["Bench press".to_string()]),
    });

    let mut dashboard = Dashboard::new();
    dashboard.load_user_data(backend.as_ref(), ctx.current().as_ref()).await;
    assert!(dashboard.workout_plan.is_none());
}

#[tokio::test]
async fn test_dashboard_goal_change_insert_failure_is_silent() {
    let (backend, ctx) = signed_in(None).await;
    backend.set_fail_writes(true);

    let coach = ScriptedCoach::new().reply("Hamstring stretch");
    let mut dashboard = Dashboard::new();
    dashboard
        .change_goal(TrainingType::Flexibility, &coach, backend.as_ref(), ctx.current().as_ref())
        .await;

    assert_eq!(dashboard.user_goal, TrainingType::Flexibility);
    assert!(dashboard.workout_plan.is_none());
}

#[tokio::test]
async fn test_dashboard_without_session_does_nothing() {
    let backend = MemoryBackend::new();
    let mut dashboard = Dashboard::new();
    dashboard.load_user_data(&backend, None).await;
    assert!(dashboard.progress.is_empty());
    assert!(dashboard.workout_plan.is_none());
}

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn test_session_survives_restart_and_sign_out_clears_it() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("session.json");
    let (backend, ctx) = signed_in(Some(path.clone())).await;
    assert!(path.exists());

    let restored = SessionContext::restore(backend.clone(), path.clone()).await;
    assert_eq!(restored.user_id(), ctx.user_id());

    let mut rx = restored.subscribe();
    restored.sign_out().await;
    assert!(rx.borrow_and_update().is_none());
    assert!(!path.exists());

    let session = ctx.current().expect("original session");
    assert!(backend.get_user(&session).await.is_err());
}

// =============================================================================
// CLI
// =============================================================================

fn fc(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fc").expect("bin");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help_lists_commands() {
    let home = TempDir::new().expect("Failed to create temp dir");
    fc(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("schedule"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("Logs are written to"));
}

#[test]
fn test_cli_rejects_unknown_training_type() {
    let home = TempDir::new().expect("Failed to create temp dir");
    fc(&home)
        .args(["schedule", "yoga"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown training type"));
}

#[test]
fn test_cli_status_offline() {
    let home = TempDir::new().expect("Failed to create temp dir");
    fc(&home)
        .args(["status", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini"))
        .stdout(predicate::str::contains("Offline mode"));
}

#[test]
fn test_cli_status_reads_config_file() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let config = home.path().join("fc.yml");
    std::fs::write(&config, "llm:\n  provider: anthropic\n  model: claude-test\n").expect("write config");

    fc(&home)
        .args(["status", "--offline", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("anthropic (claude-test)"));
}
