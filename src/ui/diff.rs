use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::{inner_rows, loaded_or_placeholder};
use crate::app::App;
use crate::diff::{DiffDocument, DiffFile, DiffLine, DiffRow, LineKind};
use crate::viewport;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let screen = &app.diff;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title(screen.loaded(), screen.cursor));
    let Some(doc) = loaded_or_placeholder(frame, screen, block.clone(), area, "Empty diff") else {
        return;
    };

    let range = viewport::window(doc.row_count(), screen.cursor, inner_rows(area));
    let lines: Vec<Line> = range
        .filter_map(|i| {
            let line = match doc.row(i)? {
                DiffRow::FileHeader(file) => file_header(file),
                DiffRow::Line(line) => diff_line(line),
            };
            Some(if i == screen.cursor {
                line.patch_style(Style::default().bg(Color::DarkGray))
            } else {
                line
            })
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn title(doc: Option<&DiffDocument>, cursor: usize) -> String {
    let Some(doc) = doc else {
        return " Diff ".to_string();
    };
    let file = doc
        .file_at(cursor)
        .map(|i| format!("  file {}/{}", i + 1, doc.files.len()))
        .unwrap_or_default();
    format!(
        " {}  +{} -{}{} ",
        doc.title,
        doc.additions(),
        doc.deletions(),
        file
    )
}

fn file_header(file: &DiffFile) -> Line<'_> {
    Line::from(vec![
        Span::styled(
            file.display_path(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format!("+{}", file.additions()), Style::default().fg(Color::Green)),
        Span::raw(" "),
        Span::styled(format!("-{}", file.deletions()), Style::default().fg(Color::Red)),
    ])
}

fn diff_line(line: &DiffLine) -> Line<'_> {
    let num = |n: Option<usize>| n.map(|n| format!("{:>5}", n)).unwrap_or_else(|| " ".repeat(5));
    let (sign, color) = match line.kind {
        LineKind::Added => ('+', Color::Green),
        LineKind::Deleted => ('-', Color::Red),
        LineKind::Context => (' ', Color::White),
    };

    Line::from(vec![
        Span::styled(
            format!("{} {} │", num(line.old_num), num(line.new_num)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("{}{}", sign, line.text), Style::default().fg(color)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_names_current_file() {
        let doc = DiffDocument::from_text(
            "PR #7",
            "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n--- a/y\n+++ b/y\n@@ -1 +1,2 @@\n c\n+d\n",
        );
        assert_eq!(title(Some(&doc), 0), " PR #7  +2 -1  file 1/2 ");
        assert_eq!(title(Some(&doc), 4), " PR #7  +2 -1  file 2/2 ");
        assert_eq!(title(None, 0), " Diff ");
    }
}
