use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::centered_rect;
use crate::tui::app::App;
use crate::util::unicode::truncate_to_width;

const LABEL_W: usize = 12;

/// Centered form with one row per field and the validation error below
pub fn render_edit_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(form) = &app.form else {
        return;
    };
    let height = form.fields.len() as u16 + 4;
    let popup = centered_rect(52, height, area);
    let value_w = (popup.width as usize).saturating_sub(LABEL_W + 4);

    let mut lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let focused = i == form.focus;
            let label_style = if focused {
                Style::default()
                    .fg(app.theme.highlight)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.dim)
            };
            Line::from(vec![
                Span::styled(format!(" {:>w$} ", field.label, w = LABEL_W - 1), label_style),
                Span::styled(
                    truncate_to_width(&field.value, value_w),
                    Style::default().fg(app.theme.text_bright),
                ),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            Style::default().fg(app.theme.red),
        )));
    }

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(app.theme.background))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.highlight))
                    .title(format!(" Edit #{} ", form.item)),
            ),
        popup,
    );

    let focused = &form.fields[form.focus];
    let cursor_x = popup.x + 1 + LABEL_W as u16 + focused.cursor_col().min(value_w) as u16;
    let cursor_y = popup.y + 1 + form.focus as u16;
    frame.set_cursor_position(Position::new(cursor_x, cursor_y));
}
