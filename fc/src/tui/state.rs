//! TUI application state
//!
//! Pure data structures for the TUI. No rendering logic here, and no I/O:
//! collaborator calls are queued in the `pending_*` fields and picked up by
//! the runner.

use tracing::debug;

use crate::chat::{ChatSession, ChatTurn};
use crate::dashboard::{Dashboard, UserData};
use crate::domain::TrainingType;
use crate::schedule::{FetchTicket, ScheduleGenerator};

/// Frames for the typing/loading indicator
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Which screen is currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Stats, programs, goal selector and current plan
    #[default]
    Dashboard,
    /// Weekly schedule for one training type
    Training(TrainingType),
    /// Conversation with the coach
    Chat,
}

/// Top-level views in left/right cycling order
pub const TOP_LEVEL_VIEWS: [View; 5] = [
    View::Dashboard,
    View::Training(TrainingType::Strength),
    View::Training(TrainingType::Cardio),
    View::Training(TrainingType::Flexibility),
    View::Chat,
];

/// Index of a view within [`TOP_LEVEL_VIEWS`]
pub fn top_level_view_index(view: &View) -> usize {
    TOP_LEVEL_VIEWS.iter().position(|v| v == view).unwrap_or(0)
}

impl View {
    /// Title shown in the header tabs
    pub fn display_name(&self) -> String {
        match self {
            View::Dashboard => "Dashboard".to_string(),
            View::Training(t) => t.title().to_string(),
            View::Chat => "Chat".to_string(),
        }
    }
}

/// How keys are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Normal,
    /// Typing into the chat input line
    ChatInput,
    /// Help overlay is open
    Help,
}

/// Rows of the dashboard's selectable list: programs, then goals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardRow {
    Program(TrainingType),
    Goal(TrainingType),
}

/// Number of selectable dashboard rows
pub const DASHBOARD_ROW_COUNT: usize = TrainingType::ALL.len() * 2;

impl DashboardRow {
    pub fn from_index(index: usize) -> Option<Self> {
        let n = TrainingType::ALL.len();
        match index {
            i if i < n => Some(DashboardRow::Program(TrainingType::ALL[i])),
            i if i < 2 * n => Some(DashboardRow::Goal(TrainingType::ALL[i - n])),
            _ => None,
        }
    }
}

/// Selection state for a list
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub selected_index: usize,
}

impl SelectionState {
    pub fn select_next(&mut self, max_items: usize) {
        if max_items > 0 && self.selected_index < max_items - 1 {
            self.selected_index += 1;
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self, max_items: usize) {
        if max_items > 0 {
            self.selected_index = max_items - 1;
        }
    }

    /// Ensure selection is within bounds
    pub fn clamp(&mut self, max_items: usize) {
        if max_items == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= max_items {
            self.selected_index = max_items - 1;
        }
    }
}

/// Complete TUI state
#[derive(Debug, Default)]
pub struct AppState {
    pub current_view: View,
    pub interaction_mode: InteractionMode,

    pub dashboard: Dashboard,
    pub dashboard_selection: SelectionState,
    /// A goal-change plan is being generated
    pub goal_loading: bool,

    pub schedule: ScheduleGenerator,
    pub schedule_selection: SelectionState,

    pub chat: ChatSession,
    pub chat_input: String,

    /// Schedule fetch waiting to be spawned
    pub pending_fetch: Option<FetchTicket>,
    /// Chat turn waiting to be spawned
    pub pending_chat: Option<ChatTurn>,
    /// Goal change waiting to be spawned
    pub pending_goal: Option<TrainingType>,
    /// Sign-out waiting to be spawned
    pub pending_sign_out: bool,

    /// Signed-in user shown in the header
    pub user_email: Option<String>,
    pub offline: bool,

    /// Transient error shown in the footer
    pub error_message: Option<String>,
    pub should_quit: bool,
    pub tick_count: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch views, keeping the chat flag and input mode in step
    pub fn navigate_to(&mut self, view: View) {
        debug!(?view, "AppState::navigate_to: called");
        if matches!(self.current_view, View::Training(_)) {
            self.schedule.discard();
            self.pending_fetch = None;
        }
        self.current_view = view;
        self.dashboard.show_chat = view == View::Chat;
        self.interaction_mode = if view == View::Chat {
            InteractionMode::ChatInput
        } else {
            InteractionMode::Normal
        };
        if let View::Training(training_type) = view {
            self.open_training(training_type);
        }
    }

    /// Show a training type with a freshly generated schedule
    fn open_training(&mut self, training_type: TrainingType) {
        self.schedule_selection.select_first();
        self.request_schedule(training_type);
    }

    /// Queue a schedule fetch; supersedes any fetch still in flight
    pub fn request_schedule(&mut self, training_type: TrainingType) {
        debug!(%training_type, "AppState::request_schedule: called");
        let ticket = self.schedule.begin_fetch(training_type);
        self.pending_fetch = Some(ticket);
    }

    /// Select a new goal and queue its plan generation
    pub fn request_goal(&mut self, goal: TrainingType) {
        debug!(%goal, "AppState::request_goal: called");
        if self.goal_loading {
            self.set_error("A plan is already being generated");
            return;
        }
        self.dashboard.user_goal = goal;
        self.goal_loading = true;
        self.pending_goal = Some(goal);
    }

    pub fn request_sign_out(&mut self) {
        debug!(user = ?self.user_email, "AppState::request_sign_out: called");
        self.pending_sign_out = true;
    }

    /// Forget the user's records and leave the TUI; there is no sign-in screen
    pub fn signed_out(&mut self) {
        debug!("AppState::signed_out: called");
        self.user_email = None;
        self.dashboard.workout_plan = None;
        self.dashboard.apply_user_data(UserData {
            progress: Some(Vec::new()),
            workout_plan: None,
        });
        self.should_quit = true;
    }

    /// Send the chat input line, if the session accepts it
    pub fn submit_chat(&mut self) {
        let text = std::mem::take(&mut self.chat_input);
        match self.chat.begin_send(&text) {
            Some(turn) => self.pending_chat = Some(turn),
            None if self.chat.is_loading() => {
                // Keep the draft until the pending reply arrives
                self.chat_input = text;
            }
            None => {}
        }
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error_message = Some(msg.into());
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Current spinner frame
    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[(self.tick_count as usize / 3) % SPINNER_FRAMES.len()]
    }

    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        let day_count = self.schedule.store().len();
        self.schedule_selection.clamp(day_count);
    }
}
