use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::model::{ItemId, Task};
use crate::tui::app::App;
use crate::util::unicode::truncate_to_width;

/// Rows per card: header, details, gap
const CARD_H: u16 = 3;

/// One column per group, titled `Name (count)` from the view tree's counter
pub fn render_board_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let containers: Vec<_> = app
        .tasks
        .tree()
        .containers()
        .map(|(g, c)| (g.clone(), c.clone()))
        .collect();
    if containers.is_empty() {
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, containers.len() as u32); containers.len()])
        .split(area);

    for ((group, container), &col_area) in containers.iter().zip(columns.iter()) {
        let border = if container.highlighted {
            Style::default().fg(app.theme.drop_target)
        } else {
            Style::default().fg(app.theme.dim)
        };
        let title = format!(
            " {} ({}) ",
            app.board.config.group_name(group),
            container.counter
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border.bg(app.theme.background))
            .title(Span::styled(
                title,
                Style::default()
                    .fg(app.theme.text_bright)
                    .add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(col_area);
        frame.render_widget(block, col_area);
        app.hits.columns.push((group.clone(), col_area));

        for (i, &id) in container.children.iter().enumerate() {
            let rect = Rect::new(
                inner.x,
                inner.y + i as u16 * CARD_H,
                inner.width,
                CARD_H - 1,
            )
            .intersection(inner);
            if rect.height < CARD_H - 1 {
                break;
            }
            render_card(frame, app, id, rect);
            app.hits.cards.push((id, rect));
        }
    }
}

fn render_card(frame: &mut Frame, app: &App, id: ItemId, area: Rect) {
    let dragging = app.tasks.tree().node(id).is_some_and(|n| n.dragging);
    let width = area.width as usize;
    let lines = match app.task(id) {
        Some(task) => card_lines(app, task, width, dragging),
        None => vec![Line::from(format!("#{}", id))],
    };
    let bg = if dragging {
        app.theme.selection_bg
    } else {
        app.theme.background
    };
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(bg)),
        area,
    );
}

fn card_lines(app: &App, task: &Task, width: usize, dragging: bool) -> Vec<Line<'static>> {
    let header_fg = if dragging {
        app.theme.dim
    } else {
        app.theme.text_bright
    };
    let due = task
        .due
        .map_or_else(|| "no due date".to_string(), |d| format!("due {}", d));
    let details = format!("{} \u{00B7} {}", due, task.priority.as_str());
    vec![
        Line::from(Span::styled(
            truncate_to_width(&task.header(), width),
            Style::default().fg(header_fg),
        )),
        Line::from(Span::styled(
            truncate_to_width(&details, width),
            Style::default().fg(app.theme.priority_color(task.priority)),
        )),
    ]
}
