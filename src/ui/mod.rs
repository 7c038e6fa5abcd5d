mod diff;
mod lists;
mod metrics;
mod queue;

use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Tabs};
use ratatui::Frame;

use crate::action::Tab;
use crate::app::{App, Status, View};
use crate::screen::{Rows, Screen, ScreenState};
use crate::types::Progress;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);

    match app.view {
        View::Diff => diff::render(frame, app, chunks[2]),
        View::List => match app.tab {
            Tab::Issues => lists::render_issues(frame, app, chunks[2]),
            Tab::PullRequests => lists::render_prs(frame, app, chunks[2]),
            Tab::ReviewQueue => queue::render(frame, app, chunks[2]),
            Tab::Commits => lists::render_commits(frame, app, chunks[2]),
            Tab::Metrics => metrics::render(frame, app, chunks[2]),
        },
    }

    render_status_bar(frame, app, chunks[3]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!("gitdash - {}", app.repo),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(user) = &app.user {
        spans.push(Span::styled(
            format!("  @{} on {}", user, app.forge_name()),
            Style::default().fg(Color::Gray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| format!("[{}] {}", i + 1, tab.title()))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

/// Loading flag and progress snapshot of whatever is on screen.
fn active_load(app: &App) -> (bool, Option<&Progress>) {
    fn of<T: Rows>(screen: &Screen<T>) -> (bool, Option<&Progress>) {
        (screen.is_loading(), screen.progress())
    }
    match app.view {
        View::Diff => of(&app.diff),
        View::List => match app.tab {
            Tab::Issues => of(&app.issues),
            Tab::PullRequests => of(&app.prs),
            Tab::ReviewQueue => of(&app.queue),
            Tab::Commits => of(&app.commits),
            Tab::Metrics => of(&app.metrics),
        },
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (loading, progress) = active_load(app);

    let status = if let Some(status) = &app.status {
        let (text, color) = status_text(status);
        Line::from(vec![Span::styled(text, Style::default().fg(color))])
    } else if loading {
        let text = match progress {
            Some(p) => format!("Loading... {} {}", p, p.current),
            None => "Loading...".to_string(),
        };
        Line::from(vec![Span::styled(text, Style::default().fg(Color::Yellow))])
    } else {
        let help = match app.view {
            View::Diff => "j/k/g/G: scroll | Ctrl+d/u: page | ]/[: files | o: open | y: yank | r: refresh | q: back",
            View::List => "1-5/Tab: tabs | j/k/g/G: nav | Ctrl+d/u: page | Enter: open | r: refresh | o/y: url | q: quit",
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

fn status_text(status: &Status) -> (&str, Color) {
    match status {
        Status::Info(text) => (text, Color::Green),
        Status::Error(text) => (text, Color::Red),
    }
}

/// Render the non-loaded states of `screen` into `area`. Returns the payload
/// when there are rows to draw.
fn loaded_or_placeholder<'a, T: Rows>(
    frame: &mut Frame,
    screen: &'a Screen<T>,
    block: Block<'_>,
    area: Rect,
    empty: &str,
) -> Option<&'a T> {
    let (text, color) = match screen.state() {
        ScreenState::Loaded(payload) if payload.row_count() > 0 => return Some(payload),
        ScreenState::Loaded(_) => (empty.to_string(), Color::Gray),
        ScreenState::Idle | ScreenState::Loading => ("Loading...".to_string(), Color::Yellow),
        ScreenState::Failed(e) => (format!("Error: {}\n\nPress r to retry", e), Color::Red),
    };
    let placeholder = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(color));
    frame.render_widget(placeholder, area);
    None
}

/// Rows available inside a bordered block.
fn inner_rows(area: Rect) -> usize {
    area.height.saturating_sub(2) as usize
}

fn selected_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn format_age(dt: DateTime<Utc>) -> String {
    format_duration(Utc::now().signed_duration_since(dt))
}

fn format_duration(duration: chrono::Duration) -> String {
    if duration.num_days() > 0 {
        format!("{}d", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m", duration.num_minutes())
    } else {
        "now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn durations_use_largest_unit() {
        assert_eq!(format_duration(chrono::Duration::hours(50)), "2d");
        assert_eq!(format_duration(chrono::Duration::minutes(90)), "1h");
        assert_eq!(format_duration(chrono::Duration::seconds(59)), "now");
    }

    #[test]
    fn confirmations_are_not_drawn_as_errors() {
        let copied = Status::Info("Copied https://github.com/o/r/pull/1".to_string());
        assert_eq!(status_text(&copied).1, Color::Green);

        let failed = Status::Error("Clipboard error: no display".to_string());
        assert_eq!(status_text(&failed), ("Clipboard error: no display", Color::Red));
    }
}
