use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::menu::MenuAction;
use crate::tui::app::App;

const MENU_W: u16 = 14;

/// Small bordered menu just below the click position, kept on screen
pub fn render_menu_popup(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some((col, row)) = app.menu.anchor() else {
        return;
    };
    let height = MenuAction::ALL.len() as u16 + 2;
    let x = col.min(area.right().saturating_sub(MENU_W));
    let y = (row + 1).min(area.bottom().saturating_sub(height));
    let popup = Rect::new(x, y, MENU_W, height).intersection(area);

    let lines: Vec<Line> = MenuAction::ALL
        .iter()
        .map(|action| {
            Line::from(vec![
                Span::styled(
                    format!(" {:<8}", action.label()),
                    Style::default().fg(app.theme.text_bright),
                ),
                Span::styled(
                    format!("{} ", action.key()),
                    Style::default().fg(app.theme.dim),
                ),
            ])
        })
        .collect();

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(app.theme.selection_bg))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.highlight)),
            ),
        popup,
    );

    for (i, action) in MenuAction::ALL.iter().enumerate() {
        let entry = Rect::new(popup.x + 1, popup.y + 1 + i as u16, MENU_W - 2, 1).intersection(popup);
        app.hits.menu.push((*action, entry));
    }
}
