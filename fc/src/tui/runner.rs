//! TUI Runner - main loop that owns the terminal and background tasks
//!
//! The TuiRunner is responsible for:
//! - Dispatching key events to App
//! - Spawning collaborator calls queued in AppState
//! - Applying task results back onto AppState, on the loop only
//! - Reacting to sign-in/sign-out from the session context

use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use fitstore::AuthSession;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::state::AppState;
use super::views;
use crate::coach::{Coach, GenerationError};
use crate::dashboard::{UserData, fetch_user_data, plan_for_goal};
use crate::domain::WorkoutPlan;
use crate::schedule::FetchTicket;
use crate::session::SessionContext;

/// Event poll interval (~30 FPS)
const TICK_RATE: Duration = Duration::from_millis(33);

/// Result from a background collaborator task
#[derive(Debug)]
pub enum TaskResult {
    Schedule {
        ticket: FetchTicket,
        result: Result<String, GenerationError>,
    },
    Chat(Result<String, GenerationError>),
    GoalPlan(Option<WorkoutPlan>),
    UserData(UserData),
}

/// Spawns collaborator calls and applies their results
///
/// Kept apart from the terminal so the task flow can run headless.
pub struct TaskDispatcher {
    coach: Arc<dyn Coach>,
    session: Arc<SessionContext>,
    tx: mpsc::UnboundedSender<TaskResult>,
}

impl TaskDispatcher {
    pub fn new(
        coach: Arc<dyn Coach>,
        session: Arc<SessionContext>,
    ) -> (Self, mpsc::UnboundedReceiver<TaskResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { coach, session, tx }, rx)
    }

    /// Spawn a task for every request queued in `state`
    pub fn dispatch(&self, state: &mut AppState) {
        if let Some(ticket) = state.pending_fetch.take() {
            debug!(training_type = %ticket.training_type, "TaskDispatcher::dispatch: schedule");
            let coach = self.coach.clone();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let result = coach.generate_weekly_schedule(ticket.training_type).await;
                let _ = tx.send(TaskResult::Schedule { ticket, result });
            });
        }

        if let Some(turn) = state.pending_chat.take() {
            debug!(history_len = turn.history.len(), "TaskDispatcher::dispatch: chat");
            let coach = self.coach.clone();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let result = coach.chat_response(&turn.message, &turn.history).await;
                let _ = tx.send(TaskResult::Chat(result));
            });
        }

        if std::mem::take(&mut state.pending_sign_out) {
            debug!("TaskDispatcher::dispatch: sign out");
            let session = self.session.clone();
            tokio::spawn(async move {
                session.sign_out().await;
            });
        }

        if let Some(goal) = state.pending_goal.take() {
            let Some(session) = self.session.current() else {
                warn!(%goal, "Goal change without a session, plan not generated");
                state.goal_loading = false;
                return;
            };
            debug!(%goal, "TaskDispatcher::dispatch: goal plan");
            let coach = self.coach.clone();
            let backend = self.session.backend().clone();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let plan = plan_for_goal(goal, coach.as_ref(), backend.as_ref(), &session).await;
                let _ = tx.send(TaskResult::GoalPlan(plan));
            });
        }
    }

    /// Load the signed-in user's records in the background
    pub fn load_user_data(&self, session: AuthSession) {
        debug!(user_id = %session.user_id(), "TaskDispatcher::load_user_data: called");
        let backend = self.session.backend().clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let data = fetch_user_data(backend.as_ref(), &session).await;
            let _ = tx.send(TaskResult::UserData(data));
        });
    }

    /// Apply a finished task to the state
    pub fn apply(state: &mut AppState, result: TaskResult) {
        match result {
            TaskResult::Schedule { ticket, result } => {
                state.schedule.complete_fetch(ticket, result);
                let day_count = state.schedule.store().len();
                state.schedule_selection.clamp(day_count);
            }
            TaskResult::Chat(result) => state.chat.complete_send(result),
            TaskResult::GoalPlan(plan) => {
                state.goal_loading = false;
                match plan {
                    Some(plan) => state.dashboard.workout_plan = Some(plan),
                    None => debug!("TaskDispatcher::apply: goal plan unavailable, keeping current plan"),
                }
            }
            TaskResult::UserData(data) => state.dashboard.apply_user_data(data),
        }
    }
}

/// TUI Runner that manages the terminal and event loop
pub struct TuiRunner {
    app: App,
    terminal: Tui,
    event_handler: EventHandler,
    dispatcher: TaskDispatcher,
    task_rx: mpsc::UnboundedReceiver<TaskResult>,
    auth_rx: watch::Receiver<Option<AuthSession>>,
}

impl TuiRunner {
    pub fn new(terminal: Tui, coach: Arc<dyn Coach>, session: Arc<SessionContext>, offline: bool) -> Self {
        debug!(offline, "TuiRunner::new: called");
        let auth_rx = session.subscribe();
        let (dispatcher, task_rx) = TaskDispatcher::new(coach, session);
        let mut app = App::new();
        app.state_mut().offline = offline;

        Self {
            app,
            terminal,
            event_handler: EventHandler::new(TICK_RATE),
            dispatcher,
            task_rx,
            auth_rx,
        }
    }

    /// Run the TUI main loop
    pub async fn run(&mut self) -> Result<()> {
        debug!("TuiRunner::run: called");
        let current = self.auth_rx.borrow_and_update().clone();
        self.apply_auth(current);

        loop {
            self.terminal.draw(|frame| views::render(self.app.state(), frame))?;

            tokio::select! {
                event = self.event_handler.next() => {
                    match event? {
                        Event::Tick => self.app.state_mut().tick(),
                        Event::Key(key_event) => {
                            if self.app.handle_key(key_event) {
                                break;
                            }
                        }
                        Event::Mouse(_) => {}
                        Event::Resize(width, height) => {
                            debug!(width, height, "TuiRunner::run: resize");
                        }
                    }
                }
                Some(result) = self.task_rx.recv() => {
                    TaskDispatcher::apply(self.app.state_mut(), result);
                }
                Ok(()) = self.auth_rx.changed() => {
                    let session = self.auth_rx.borrow_and_update().clone();
                    self.apply_auth(session);
                }
            }

            self.dispatcher.dispatch(self.app.state_mut());

            if self.app.state().should_quit {
                break;
            }
        }

        debug!("TuiRunner::run: exiting");
        Ok(())
    }

    /// Track the signed-in user and load their records
    fn apply_auth(&mut self, session: Option<AuthSession>) {
        let state = self.app.state_mut();
        match session {
            Some(session) => {
                info!(user_id = %session.user_id(), "TUI session active");
                state.user_email = session.user.email.clone();
                self.dispatcher.load_user_data(session);
            }
            None => {
                info!("TUI session signed out");
                state.signed_out();
            }
        }
    }
}
