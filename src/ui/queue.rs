use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, ListItem};
use ratatui::Frame;

use super::lists::render_list;
use super::{format_duration, inner_rows, loaded_or_placeholder, selected_style, truncate};
use crate::app::App;
use crate::pipeline::EntryState;
use crate::types::{ReviewState, ReviewSummary};
use crate::viewport;

const BADGE_WIDTH: usize = 26;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let screen = &app.queue;
    let title = match screen.loaded() {
        Some(queue) => {
            let (resolved, total) = queue.progress();
            format!(" Review Queue ({}/{}) ", resolved, total)
        }
        None => " Review Queue ".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let Some(queue) =
        loaded_or_placeholder(frame, screen, block.clone(), area, "No open pull requests")
    else {
        return;
    };

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 7 + 17 + BADGE_WIDTH;
    let flex = w.saturating_sub(fixed).max(10);
    let range = viewport::window(queue.len(), screen.cursor, inner_rows(area));

    let items: Vec<ListItem> = queue.entries()[range.clone()]
        .iter()
        .enumerate()
        .map(|(offset, entry)| {
            let index = range.start + offset;
            let style = if index == screen.cursor {
                selected_style()
            } else {
                Style::default()
            };

            let (badge, badge_color) = match &entry.state {
                EntryState::Pending if index == queue.cursor() && queue.in_flight() => {
                    ("fetching reviews...".to_string(), Color::Yellow)
                }
                EntryState::Pending => ("queued".to_string(), Color::DarkGray),
                EntryState::Loaded(summary) => summary_badge(summary),
                EntryState::Failed(e) => (format!("! {}", e), Color::Red),
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("#{:<5} ", entry.item.number),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(format!("{:<flex$}", truncate(&entry.item.title, flex)), style),
                Span::styled(
                    format!(" @{:<15}", truncate(&entry.item.author, 15)),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    truncate(&badge, BADGE_WIDTH),
                    Style::default().fg(badge_color),
                ),
            ]))
        })
        .collect();

    render_list(frame, block, area, items, Some(screen.cursor.saturating_sub(range.start)));
}

fn summary_badge(summary: &ReviewSummary) -> (String, Color) {
    let Some(wait) = summary.wait else {
        return ("no reviews".to_string(), Color::Magenta);
    };
    let color = match summary.decision {
        Some(ReviewState::Approved) => Color::Green,
        Some(ReviewState::ChangesRequested) => Color::Red,
        _ => Color::Gray,
    };
    let decision = summary
        .decision
        .map(|d| d.to_string())
        .unwrap_or_else(|| format!("{} reviews", summary.review_count));
    (format!("{} after {}", decision, format_duration(wait)), color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Review;
    use chrono::{TimeZone, Utc};

    #[test]
    fn badge_shows_decision_and_wait() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let reviews = [Review {
            author: "r".to_string(),
            state: ReviewState::ChangesRequested,
            submitted_at: Some(Utc.with_ymd_and_hms(2024, 3, 3, 1, 0, 0).unwrap()),
        }];
        let (text, color) = summary_badge(&ReviewSummary::derive(created, &reviews));
        assert_eq!(text, "✗ changes after 2d");
        assert_eq!(color, Color::Red);
    }

    #[test]
    fn unreviewed_prs_are_flagged() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let (text, _) = summary_badge(&ReviewSummary::derive(created, &[]));
        assert_eq!(text, "no reviews");
    }
}
