//! TUI application - key handling
//!
//! The App struct owns the AppState and turns key events into state changes.
//! It does not do any rendering or I/O.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use super::state::{
    AppState, DASHBOARD_ROW_COUNT, DashboardRow, InteractionMode, TOP_LEVEL_VIEWS, View, top_level_view_index,
};
use crate::domain::TrainingType;

/// TUI application
#[derive(Debug, Default)]
pub struct App {
    state: AppState,
}

impl App {
    pub fn new() -> Self {
        Self { state: AppState::new() }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Handle a key event
    ///
    /// Returns true if the application should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        self.state.clear_error();

        match self.state.interaction_mode {
            InteractionMode::Normal => self.handle_normal_key(key),
            InteractionMode::ChatInput => self.handle_chat_input_key(key),
            InteractionMode::Help => {
                self.state.interaction_mode = InteractionMode::Normal;
            }
        }
        self.state.should_quit
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('L') => self.state.request_sign_out(),
            KeyCode::Char('?') | KeyCode::F(1) => self.state.interaction_mode = InteractionMode::Help,
            KeyCode::Tab => self.toggle_chat(),
            KeyCode::Left => self.navigate_prev_top_level_view(),
            KeyCode::Right => self.navigate_next_top_level_view(),
            KeyCode::Esc => {
                if self.state.current_view != View::Dashboard {
                    self.state.navigate_to(View::Dashboard);
                }
            }
            _ => match self.state.current_view {
                View::Dashboard => self.handle_dashboard_key(key),
                View::Training(training_type) => self.handle_training_key(key, training_type),
                View::Chat => {
                    // Any other key starts typing again
                    self.state.interaction_mode = InteractionMode::ChatInput;
                    self.handle_chat_input_key(key);
                }
            },
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.state.dashboard_selection.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.state.dashboard_selection.select_next(DASHBOARD_ROW_COUNT),
            KeyCode::Char('g') => self.state.dashboard_selection.select_first(),
            KeyCode::Char('G') => self.state.dashboard_selection.select_last(DASHBOARD_ROW_COUNT),
            KeyCode::Char('s') => self.state.request_goal(TrainingType::Strength),
            KeyCode::Char('c') => self.state.request_goal(TrainingType::Cardio),
            KeyCode::Char('f') => self.state.request_goal(TrainingType::Flexibility),
            KeyCode::Enter => match DashboardRow::from_index(self.state.dashboard_selection.selected_index) {
                Some(DashboardRow::Program(t)) => self.state.navigate_to(View::Training(t)),
                Some(DashboardRow::Goal(t)) => self.state.request_goal(t),
                None => {}
            },
            _ => {}
        }
    }

    fn handle_training_key(&mut self, key: KeyEvent, training_type: TrainingType) {
        let day_count = self.state.schedule.store().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.state.schedule_selection.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.state.schedule_selection.select_next(day_count),
            KeyCode::Char('g') => self.state.schedule_selection.select_first(),
            KeyCode::Char('G') => self.state.schedule_selection.select_last(day_count),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if day_count > 0 {
                    let index = self.state.schedule_selection.selected_index as isize;
                    self.state.schedule.toggle(index);
                }
            }
            KeyCode::Char('r') => {
                self.state.schedule_selection.select_first();
                self.state.request_schedule(training_type);
            }
            _ => {}
        }
    }

    fn handle_chat_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.state.submit_chat(),
            KeyCode::Backspace => {
                self.state.chat_input.pop();
            }
            KeyCode::Esc => self.state.interaction_mode = InteractionMode::Normal,
            KeyCode::Tab => self.toggle_chat(),
            KeyCode::Char(c) => self.state.chat_input.push(c),
            _ => {}
        }
    }

    /// Open the chat, or close it back to the dashboard
    fn toggle_chat(&mut self) {
        debug!(show_chat = self.state.dashboard.show_chat, "App::toggle_chat: called");
        self.state.dashboard.toggle_chat();
        let view = if self.state.dashboard.show_chat {
            View::Chat
        } else {
            View::Dashboard
        };
        self.state.navigate_to(view);
    }

    fn navigate_prev_top_level_view(&mut self) {
        let current = top_level_view_index(&self.state.current_view);
        let prev = (current + TOP_LEVEL_VIEWS.len() - 1) % TOP_LEVEL_VIEWS.len();
        self.state.navigate_to(TOP_LEVEL_VIEWS[prev]);
    }

    fn navigate_next_top_level_view(&mut self) {
        let current = top_level_view_index(&self.state.current_view);
        let next = (current + 1) % TOP_LEVEL_VIEWS.len();
        self.state.navigate_to(TOP_LEVEL_VIEWS[next]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DayRecord;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_quit_keys() {
        let mut app = App::new();
        assert!(app.handle_key(key(KeyCode::Char('q'))));

        let mut app = App::new();
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_arrows_cycle_top_level_views() {
        let mut app = App::new();
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.state().current_view, View::Training(TrainingType::Strength));

        app.handle_key(key(KeyCode::Left));
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.state().current_view, View::Chat);
    }

    #[test]
    fn test_shift_l_requests_sign_out() {
        let mut app = App::new();
        app.handle_key(key(KeyCode::Char('l')));
        assert!(!app.state().pending_sign_out);

        assert!(!app.handle_key(KeyEvent::new(KeyCode::Char('L'), KeyModifiers::SHIFT)));
        assert!(app.state().pending_sign_out);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut app = App::new();
        app.handle_key(key(KeyCode::Char('?')));
        assert_eq!(app.state().interaction_mode, InteractionMode::Help);
        assert!(!app.handle_key(key(KeyCode::Char('q'))));
        assert_eq!(app.state().interaction_mode, InteractionMode::Normal);
    }

    #[test]
    fn test_enter_on_program_opens_training() {
        let mut app = App::new();
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.state().current_view, View::Training(TrainingType::Cardio));
        assert!(app.state().pending_fetch.is_some());
    }

    #[test]
    fn test_goal_keys_and_goal_rows() {
        let mut app = App::new();
        app.handle_key(key(KeyCode::Char('f')));
        assert_eq!(app.state().pending_goal, Some(TrainingType::Flexibility));

        let mut app = App::new();
        for _ in 0..4 {
            app.handle_key(key(KeyCode::Char('j')));
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state().pending_goal, Some(TrainingType::Cardio));
        assert_eq!(app.state().current_view, View::Dashboard);
    }

    #[test]
    fn test_training_toggle_and_refetch() {
        let mut app = App::new();
        app.state_mut().navigate_to(View::Training(TrainingType::Strength));
        let ticket = app.state_mut().pending_fetch.take().unwrap();
        app.state_mut()
            .schedule
            .complete_fetch(ticket, Ok("Day 1: Squats Day 2: Rest".to_string()));

        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char(' ')));
        let days: Vec<DayRecord> = app.state().schedule.store().days().to_vec();
        assert!(!days[0].expanded);
        assert!(days[1].expanded);

        app.handle_key(key(KeyCode::Char('r')));
        assert!(app.state().pending_fetch.is_some());
        assert!(app.state().schedule.is_loading());
        assert_eq!(app.state().schedule_selection.selected_index, 0);
    }

    #[test]
    fn test_chat_input_flow() {
        let mut app = App::new();
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.state().current_view, View::Chat);
        assert_eq!(app.state().interaction_mode, InteractionMode::ChatInput);

        type_text(&mut app, "hiq");
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.state().chat_input, "hi");

        app.handle_key(key(KeyCode::Enter));
        let turn = app.state().pending_chat.clone().unwrap();
        assert_eq!(turn.message, "hi");
        assert!(turn.history.is_empty());
        assert!(app.state().chat.is_loading());

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.state().current_view, View::Dashboard);
        assert!(!app.state().dashboard.show_chat);
    }

    #[test]
    fn test_chat_esc_then_typing_resumes_input() {
        let mut app = App::new();
        app.state_mut().navigate_to(View::Chat);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.state().interaction_mode, InteractionMode::Normal);

        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.state().interaction_mode, InteractionMode::ChatInput);
        assert_eq!(app.state().chat_input, "x");
    }
}
