pub mod board_view;
pub mod edit_popup;
pub mod grid_view;
pub mod menu_popup;
pub mod status_row;
pub mod tab_bar;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::{App, View};

/// Main render function. Also rebuilds the hit map used by mouse input.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    app.hits.clear();

    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // tab bar | content | status row
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    tab_bar::render_tab_bar(frame, app, chunks[0]);

    match app.view {
        View::Grid => grid_view::render_grid_view(frame, app, chunks[1]),
        View::Board => board_view::render_board_view(frame, app, chunks[1]),
    }

    if app.menu.is_open() {
        menu_popup::render_menu_popup(frame, app, area);
    }

    if app.form.is_some() {
        edit_popup::render_edit_popup(frame, app, area);
    }

    status_row::render_status_row(frame, app, chunks[2]);
}

/// A `width` x `height` rect centered in `area`, clamped to fit
pub(super) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
