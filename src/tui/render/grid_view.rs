use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::model::GroupId;
use crate::tui::app::App;
use crate::util::unicode::truncate_to_width;

pub const TILE_W: u16 = 16;
pub const TILE_H: u16 = 3;

/// Tiles flow left to right, top to bottom, in collection order
pub fn render_grid_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let cols = (area.width / TILE_W).max(1);
    let tree = app.grid.tree();
    let order = tree.children(&GroupId::root()).to_vec();

    for (i, id) in order.into_iter().enumerate() {
        let i = i as u16;
        let rect = Rect::new(
            area.x + (i % cols) * TILE_W,
            area.y + 1 + (i / cols) * TILE_H,
            TILE_W,
            TILE_H,
        )
        .intersection(area);
        if rect.height < TILE_H {
            continue;
        }

        let node = app.grid.tree().node(id).cloned().unwrap_or_default();
        let (border, text) = if node.highlighted {
            (
                Style::default().fg(app.theme.drop_target),
                Style::default()
                    .fg(app.theme.text_bright)
                    .add_modifier(Modifier::BOLD),
            )
        } else if node.dragging {
            (
                Style::default().fg(app.theme.dragging),
                Style::default().fg(app.theme.dim),
            )
        } else {
            (
                Style::default().fg(app.theme.dim),
                Style::default().fg(app.theme.text),
            )
        };
        let border_type = if node.dragging {
            BorderType::Double
        } else {
            BorderType::Rounded
        };

        let label = truncate_to_width(app.tile_label(id), (TILE_W - 2) as usize);
        let tile = Paragraph::new(label)
            .style(text.bg(app.theme.background))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(border_type)
                    .border_style(border.bg(app.theme.background)),
            );
        frame.render_widget(tile, rect);
        app.hits.tiles.push((id, rect));
    }
}
