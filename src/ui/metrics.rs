use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, ListItem, Paragraph};
use ratatui::Frame;

use super::lists::render_list;
use super::{inner_rows, loaded_or_placeholder, selected_style};
use crate::app::App;
use crate::types::Metrics;
use crate::viewport;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let screen = &app.metrics;

    if screen.is_loading() {
        if let Some(progress) = screen.progress() {
            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::ALL).title(" Scanning "))
                .gauge_style(Style::default().fg(Color::Cyan))
                .ratio(progress.ratio())
                .label(format!("{}  {}", progress, progress.current));
            let gauge_area = Rect {
                height: area.height.min(3),
                ..area
            };
            frame.render_widget(gauge, gauge_area);
            return;
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Metrics ({} repositories) ", screen.row_count()));
    let Some(metrics) =
        loaded_or_placeholder(frame, screen, block.clone(), area, "No repositories configured")
    else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    frame.render_widget(totals(metrics), chunks[0]);

    let range = viewport::window(metrics.repos.len(), screen.cursor, inner_rows(chunks[1]));
    let items: Vec<ListItem> = metrics.repos[range.clone()]
        .iter()
        .enumerate()
        .map(|(offset, stats)| {
            let style = if range.start + offset == screen.cursor {
                selected_style()
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<32}", stats.repo.to_string()), style),
                Span::styled(format!("★ {:<7}", stats.stars), Style::default().fg(Color::Yellow)),
                Span::styled(format!("forks {:<6}", stats.forks), Style::default().fg(Color::Gray)),
                Span::styled(
                    format!("issues {:<6}", stats.open_issues),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(format!("PRs {}", stats.open_prs), Style::default().fg(Color::Magenta)),
            ]))
        })
        .collect();

    render_list(frame, block, chunks[1], items, Some(screen.cursor.saturating_sub(range.start)));
}

fn totals(metrics: &Metrics) -> Paragraph<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    Paragraph::new(Line::from(vec![
        Span::styled("Total  ", bold),
        Span::raw(format!("★ {}   ", metrics.total_stars)),
        Span::raw(format!("forks {}   ", metrics.total_forks)),
        Span::raw(format!("open issues {}   ", metrics.total_open_issues)),
        Span::raw(format!("open PRs {}", metrics.total_open_prs)),
    ]))
    .block(Block::default().borders(Borders::ALL))
}
