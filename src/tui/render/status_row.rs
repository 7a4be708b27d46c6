use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, View};
use crate::util::unicode::{display_width, truncate_to_width};

/// Bottom row: the latest notice (or key hints) on the left, sync activity
/// on the right
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let in_flight = app.in_flight();
    let right = if in_flight > 0 {
        format!("syncing {} ", in_flight)
    } else {
        String::new()
    };
    let right_width = display_width(&right);

    let (left, left_style) = match &app.notice {
        Some(notice) => (
            format!(" {}", notice),
            Style::default().fg(app.theme.red).bg(bg),
        ),
        None => (hints(app).to_string(), Style::default().fg(app.theme.dim).bg(bg)),
    };
    let left = truncate_to_width(&left, width.saturating_sub(right_width + 1));
    let padding = width.saturating_sub(display_width(&left) + right_width);

    let line = Line::from(vec![
        Span::styled(left, left_style),
        Span::styled(" ".repeat(padding), Style::default().bg(bg)),
        Span::styled(right, Style::default().fg(app.theme.yellow).bg(bg)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn hints(app: &App) -> &'static str {
    if app.form.is_some() {
        " Tab next field  Enter save  Esc close"
    } else if app.menu.is_open() {
        " e edit  d delete  Esc close"
    } else {
        match app.view {
            View::Grid => " drag to swap  Tab tasks  r reload  q quit",
            View::Board => " drag to move  right-click menu  Tab tiles  r reload  q quit",
        }
    }
}
