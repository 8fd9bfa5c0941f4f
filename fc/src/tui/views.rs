//! TUI views and rendering

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Sparkline, Wrap};
use tracing::trace;

use super::state::{AppState, DASHBOARD_ROW_COUNT, DashboardRow, InteractionMode, TOP_LEVEL_VIEWS, View};
use crate::domain::TrainingType;
use crate::schedule::FetchState;

mod colors {
    use ratatui::style::Color;

    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255);
    pub const ACTIVE: Color = Color::Rgb(0, 255, 127); // Spring green
    pub const LOADING: Color = Color::Rgb(255, 215, 0); // Gold
    pub const FAILED: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const SELECTED_BG: Color = Color::Rgb(40, 40, 40);
    pub const DIM: Color = Color::DarkGray;

    pub const CHAT_USER: Color = Color::Rgb(0, 255, 127);
    pub const CHAT_ASSISTANT: Color = Color::Rgb(100, 149, 237); // Cornflower blue
}

/// Main render function
pub fn render(state: &AppState, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(state, frame, chunks[0]);

    match state.current_view {
        View::Dashboard => render_dashboard(state, frame, chunks[1]),
        View::Training(training_type) => render_training(state, training_type, frame, chunks[1]),
        View::Chat => render_chat(state, frame, chunks[1]),
    }

    render_footer(state, frame, chunks[2]);

    if state.interaction_mode == InteractionMode::Help {
        render_help_overlay(frame, chunks[1]);
    }
}

/// Header with view tabs and the signed-in user
fn render_header(state: &AppState, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(
            "FitCoach ",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::raw("│"),
    ];
    for view in TOP_LEVEL_VIEWS {
        let style = if view == state.current_view {
            Style::default().fg(colors::ACTIVE).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors::DIM)
        };
        spans.push(Span::styled(format!(" {} ", view.display_name()), style));
    }
    spans.push(Span::raw("│ "));
    let user = match (&state.user_email, state.offline) {
        (_, true) => "offline".to_string(),
        (Some(email), false) => email.clone(),
        (None, false) => "signed out".to_string(),
    };
    spans.push(Span::styled(user, Style::default().fg(colors::DIM)));

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_dashboard(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!("render_dashboard: called");
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),                               // Stats
            Constraint::Length(DASHBOARD_ROW_COUNT as u16 + 4), // Programs + goals
            Constraint::Min(3),                                  // Progress sparkline
        ])
        .split(columns[0]);

    render_stats(state, frame, left[0]);
    render_dashboard_rows(state, frame, left[1]);
    render_progress(state, frame, left[2]);
    render_workout_plan(state, frame, columns[1]);
}

fn render_stats(state: &AppState, frame: &mut Frame, area: Rect) {
    let stats = &state.dashboard.stats;
    let latest = stats
        .latest_progress
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string());
    let lines = vec![
        Line::from(vec![
            Span::styled("Goal:     ", Style::default().fg(colors::DIM)),
            Span::styled(
                state.dashboard.user_goal.title(),
                Style::default().fg(colors::ACTIVE).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Progress: ", Style::default().fg(colors::DIM)),
            Span::raw(format!("{} ({} entries)", latest, stats.metric_count)),
        ]),
        Line::from(vec![
            Span::styled("Streak:   ", Style::default().fg(colors::DIM)),
            Span::raw(format!("{} days", stats.streak_days)),
        ]),
    ];
    let block = Block::default().borders(Borders::ALL).title(" Overview ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Training programs followed by the goal selector
fn render_dashboard_rows(state: &AppState, frame: &mut Frame, area: Rect) {
    let mut items = Vec::with_capacity(DASHBOARD_ROW_COUNT + 2);
    items.push(ListItem::new(Line::from(Span::styled(
        "Programs",
        Style::default().add_modifier(Modifier::UNDERLINED),
    ))));

    for index in 0..DASHBOARD_ROW_COUNT {
        if index == TrainingType::ALL.len() {
            items.push(ListItem::new(Line::from(Span::styled(
                "Goal  [s]trength [c]ardio [f]lexibility",
                Style::default().add_modifier(Modifier::UNDERLINED),
            ))));
        }
        let line = match DashboardRow::from_index(index) {
            Some(DashboardRow::Program(t)) => Line::from(format!("  {} Training", t.title())),
            Some(DashboardRow::Goal(t)) => {
                let marker = if t == state.dashboard.user_goal { "●" } else { "○" };
                Line::from(format!("  {} {}", marker, t.title()))
            }
            None => continue,
        };
        let item = ListItem::new(line);
        if index == state.dashboard_selection.selected_index {
            items.push(item.style(Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD)));
        } else {
            items.push(item);
        }
    }

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Training "));
    frame.render_widget(list, area);
}

fn render_progress(state: &AppState, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Progress ");
    let values = state.dashboard.progress_values();
    if values.is_empty() {
        let empty = Paragraph::new(Span::styled("No progress recorded yet", Style::default().fg(colors::DIM)));
        frame.render_widget(empty.block(block), area);
        return;
    }

    let spark_data: Vec<u64> = values.iter().map(|v| (v.max(0.0) * 100.0).round() as u64).collect();
    let sparkline = Sparkline::default()
        .block(block)
        .data(&spark_data)
        .style(Style::default().fg(colors::ACTIVE));
    frame.render_widget(sparkline, area);
}

fn render_workout_plan(state: &AppState, frame: &mut Frame, area: Rect) {
    let mut lines = Vec::new();
    if state.goal_loading {
        lines.push(Line::from(Span::styled(
            format!("{} Generating a new plan...", state.spinner()),
            Style::default().fg(colors::LOADING),
        )));
        lines.push(Line::from(""));
    }

    match &state.dashboard.workout_plan {
        Some(plan) => {
            lines.push(Line::from(Span::styled(
                plan.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("{} · {}", plan.duration, plan.intensity),
                Style::default().fg(colors::DIM),
            )));
            lines.push(Line::from(""));
            for exercise in &plan.exercises {
                lines.push(Line::from(format!("• {}", exercise)));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "No workout plan yet. Pick a goal to generate one.",
            Style::default().fg(colors::DIM),
        ))),
    }

    let block = Block::default().borders(Borders::ALL).title(" Current Plan ");
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

/// Description paragraph and the schedule cards
fn render_training(state: &AppState, training_type: TrainingType, frame: &mut Frame, area: Rect) {
    trace!(%training_type, "render_training: called");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let description = Paragraph::new(training_type.description())
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} Training ", training_type.title())),
        );
    frame.render_widget(description, chunks[0]);

    let block = Block::default().borders(Borders::ALL).title(" Weekly Schedule ");
    let generator = &state.schedule;
    let status = match generator.state() {
        FetchState::Loading => Some(Line::from(Span::styled(
            format!("{} Loading schedule...", state.spinner()),
            Style::default().fg(colors::LOADING),
        ))),
        FetchState::Error => generator
            .error()
            .map(|e| Line::from(Span::styled(e.to_string(), Style::default().fg(colors::FAILED)))),
        FetchState::Idle | FetchState::Ready => None,
    };
    if let Some(status) = status {
        frame.render_widget(Paragraph::new(status).block(block), chunks[1]);
        return;
    }

    let mut lines = Vec::new();
    for (index, day) in generator.store().days().iter().enumerate() {
        let selected = index == state.schedule_selection.selected_index;
        let arrow = if day.expanded { "▾" } else { "▸" };
        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if selected {
            style = style.bg(colors::SELECTED_BG).fg(colors::ACTIVE);
        }
        lines.push(Line::from(Span::styled(format!("{} {}", arrow, day.label), style)));
        if day.expanded {
            for content_line in day.content.lines() {
                lines.push(Line::from(format!("    {}", content_line)));
            }
            lines.push(Line::from(""));
        }
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No schedule yet. Press r to generate one.",
            Style::default().fg(colors::DIM),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), chunks[1]);
}

/// Transcript plus the input line
fn render_chat(state: &AppState, frame: &mut Frame, area: Rect) {
    trace!(message_count = state.chat.messages().len(), "render_chat: called");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    for msg in state.chat.messages() {
        let (who, color) = if msg.is_user {
            ("You", colors::CHAT_USER)
        } else {
            ("Coach", colors::CHAT_ASSISTANT)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", who), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(msg.time_label(), Style::default().fg(colors::DIM)),
        ]));
        if msg.is_user {
            for text_line in msg.text.lines() {
                lines.push(Line::from(format!("  {}", text_line)));
            }
        } else {
            let markdown_text = tui_markdown::from_str(&msg.text);
            for line in markdown_text.lines.iter() {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(line.spans.iter().cloned());
                lines.push(Line::from(spans));
            }
        }
        lines.push(Line::from(""));
    }

    if state.chat.is_loading() {
        lines.push(Line::from(Span::styled(
            format!("{} Coach is typing...", state.spinner()),
            Style::default().fg(colors::LOADING),
        )));
    } else if let Some(error) = state.chat.last_error() {
        lines.push(Line::from(Span::styled(error.to_string(), Style::default().fg(colors::FAILED))));
    }

    // Pin the newest line to the bottom; count rows after wrapping, inside the borders
    let transcript = Paragraph::new(lines).wrap(Wrap { trim: false });
    let rows = transcript.line_count(chunks[0].width.saturating_sub(2));
    let viewport_height = usize::from(chunks[0].height.saturating_sub(2));
    let scroll = u16::try_from(rows.saturating_sub(viewport_height)).unwrap_or(u16::MAX);
    let transcript = transcript
        .block(Block::default().borders(Borders::ALL).title(" Chat with your coach "))
        .scroll((scroll, 0));
    frame.render_widget(transcript, chunks[0]);

    let typing = state.interaction_mode == InteractionMode::ChatInput;
    let mut input = vec![
        Span::styled("> ", Style::default().fg(colors::KEYBIND)),
        Span::raw(state.chat_input.as_str()),
    ];
    if typing {
        input.push(Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)));
    }
    let border = if typing { colors::KEYBIND } else { colors::DIM };
    let input = Paragraph::new(Line::from(input)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(input, chunks[1]);
}

fn render_footer(state: &AppState, frame: &mut Frame, area: Rect) {
    let content = if let Some(ref error) = state.error_message {
        Line::from(Span::styled(format!(" Error: {}", error), Style::default().fg(colors::FAILED)))
    } else {
        let keybinds: &[(&str, &str)] = match (&state.current_view, state.interaction_mode) {
            (View::Chat, InteractionMode::ChatInput) => &[("[Enter]", "Send"), ("[Esc]", "Stop typing"), ("[Tab]", "Close chat")],
            (View::Chat, _) => &[("[←/→]", "Views"), ("[Tab]", "Close chat"), ("[?]", "Help"), ("[q]", "Quit")],
            (View::Training(_), _) => &[
                ("[j/k]", "Select"),
                ("[Enter]", "Expand"),
                ("[r]", "Regenerate"),
                ("[←/→]", "Views"),
                ("[?]", "Help"),
                ("[q]", "Quit"),
            ],
            (View::Dashboard, _) => &[
                ("[j/k]", "Select"),
                ("[Enter]", "Open"),
                ("[s/c/f]", "Goal"),
                ("[Tab]", "Chat"),
                ("[L]", "Sign out"),
                ("[?]", "Help"),
                ("[q]", "Quit"),
            ],
        };
        let mut spans = Vec::new();
        for (key, label) in keybinds {
            spans.push(Span::styled(format!(" {}", key), Style::default().fg(colors::KEYBIND)));
            spans.push(Span::raw(format!(" {} ", label)));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(content).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 70, area);
    let key_style = Style::default().fg(colors::KEYBIND);
    let rows = [
        ("←/→", "Switch view"),
        ("Tab", "Open or close chat"),
        ("j/k, ↑/↓", "Move selection"),
        ("Enter", "Open program / pick goal / expand day"),
        ("Space", "Expand or collapse a day"),
        ("s c f", "Set goal: strength, cardio, flexibility"),
        ("r", "Regenerate the schedule"),
        ("Esc", "Back to dashboard / stop typing"),
        ("L", "Sign out"),
        ("q, Ctrl-C", "Quit"),
    ];
    let mut lines = vec![Line::from("")];
    for (key, desc) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<12}", key), key_style),
            Span::raw(desc),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  Press any key to close", Style::default().fg(Color::Gray))));

    let help = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .border_style(Style::default().fg(colors::HEADER)),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(help, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
