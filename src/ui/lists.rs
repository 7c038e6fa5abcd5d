use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;

use super::{format_age, inner_rows, loaded_or_placeholder, selected_style, truncate};
use crate::app::App;
use crate::types::{IssueState, PrState};
use crate::viewport;

/// Draw the visible `items` with the cursor row highlighted.
pub(super) fn render_list(
    frame: &mut Frame,
    block: Block<'_>,
    area: Rect,
    items: Vec<ListItem<'_>>,
    selected: Option<usize>,
) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

pub fn render_issues(frame: &mut Frame, app: &App, area: Rect) {
    let screen = &app.issues;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Issues ({}) ", screen.row_count()));
    let Some(issues) = loaded_or_placeholder(frame, screen, block.clone(), area, "No open issues")
    else {
        return;
    };

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 44; // #num(6) + state(7) + labels(19) + age(5) + @author(7)
    let flex = w.saturating_sub(fixed).max(10);
    let range = viewport::window(issues.len(), screen.cursor, inner_rows(area));

    let items: Vec<ListItem> = issues[range.clone()]
        .iter()
        .enumerate()
        .map(|(offset, issue)| {
            let style = if range.start + offset == screen.cursor {
                selected_style()
            } else {
                Style::default()
            };
            let state_color = match issue.state {
                IssueState::Open => Color::Green,
                IssueState::Closed => Color::Red,
            };
            let labels = if issue.labels.is_empty() {
                String::new()
            } else {
                format!("[{}]", truncate(&issue.labels.join(", "), 16))
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("#{:<5}", issue.number), Style::default().fg(Color::Cyan)),
                Span::raw(" "),
                Span::styled(format!("{:6}", issue.state.to_string()), Style::default().fg(state_color)),
                Span::raw(" "),
                Span::styled(format!("{:<flex$}", truncate(&issue.title, flex)), style),
                Span::raw(" "),
                Span::styled(format!("{:<18}", labels), Style::default().fg(Color::Magenta)),
                Span::styled(
                    format!("{:>4} ", format_age(issue.updated_at)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("@{}", issue.author), Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();

    render_list(frame, block, area, items, Some(screen.cursor.saturating_sub(range.start)));
}

pub fn render_prs(frame: &mut Frame, app: &App, area: Rect) {
    let screen = &app.prs;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Pull Requests ({}) ", screen.row_count()));
    let Some(prs) =
        loaded_or_placeholder(frame, screen, block.clone(), area, "No open pull requests")
    else {
        return;
    };

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 36;
    let flex = w.saturating_sub(fixed).max(10);
    let range = viewport::window(prs.len(), screen.cursor, inner_rows(area));

    let items: Vec<ListItem> = prs[range.clone()]
        .iter()
        .enumerate()
        .map(|(offset, pr)| {
            let style = if range.start + offset == screen.cursor {
                selected_style()
            } else {
                Style::default()
            };
            let (state_text, state_color) = match (pr.draft, pr.state) {
                (true, PrState::Open) => ("Draft".to_string(), Color::DarkGray),
                (_, PrState::Open) => (pr.state.to_string(), Color::Green),
                (_, PrState::Closed) => (pr.state.to_string(), Color::Red),
                (_, PrState::Merged) => (pr.state.to_string(), Color::Magenta),
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("#{:<5}", pr.number), Style::default().fg(Color::Cyan)),
                Span::raw(" "),
                Span::styled(format!("{:6}", state_text), Style::default().fg(state_color)),
                Span::raw(" "),
                Span::styled(format!("{:<flex$}", truncate(&pr.title, flex)), style),
                Span::styled(
                    format!(" {:>4} ", format_age(pr.updated_at)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("@{}", truncate(&pr.author, 15)),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    render_list(frame, block, area, items, Some(screen.cursor.saturating_sub(range.start)));
}

pub fn render_commits(frame: &mut Frame, app: &App, area: Rect) {
    let screen = &app.commits;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Commits ({}) ", screen.row_count()));
    let Some(commits) = loaded_or_placeholder(frame, screen, block.clone(), area, "No commits")
    else {
        return;
    };

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 32; // sha(8) + age(6) + @author(18)
    let flex = w.saturating_sub(fixed).max(10);
    let range = viewport::window(commits.len(), screen.cursor, inner_rows(area));

    let items: Vec<ListItem> = commits[range.clone()]
        .iter()
        .enumerate()
        .map(|(offset, commit)| {
            let style = if range.start + offset == screen.cursor {
                selected_style()
            } else {
                Style::default()
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<8}", commit.short_sha()),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(format!("{:<flex$}", truncate(&commit.message, flex)), style),
                Span::styled(
                    format!(" {:>4} ", format_age(commit.date)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("@{}", truncate(&commit.author, 16)),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    render_list(frame, block, area, items, Some(screen.cursor.saturating_sub(range.start)));
}
