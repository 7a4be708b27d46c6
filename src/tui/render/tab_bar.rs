use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, View};
use crate::util::unicode::display_width;

/// One row: board name, then a tab per view
pub fn render_tab_bar(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let mut spans: Vec<Span> = vec![Span::styled(
        format!(" {} ", app.board.config.board.name),
        Style::default().fg(app.theme.highlight).bg(bg),
    )];
    let mut col = area.x + display_width(&app.board.config.board.name) as u16 + 2;

    let tabs = [
        (View::Grid, " Tiles ".to_string()),
        (View::Board, format!(" Tasks ({}) ", app.tasks.collection().len())),
    ];
    for (view, label) in tabs {
        spans.push(Span::styled("\u{2502}", Style::default().fg(app.theme.dim).bg(bg)));
        col += 1;
        let style = if app.view == view {
            Style::default()
                .fg(app.theme.text_bright)
                .bg(app.theme.selection_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.dim).bg(bg)
        };
        let width = display_width(&label) as u16;
        app.hits
            .tabs
            .push((view, Rect::new(col, area.y, width, 1).intersection(area)));
        col += width;
        spans.push(Span::styled(label, style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
