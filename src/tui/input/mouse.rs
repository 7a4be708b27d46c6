use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use tracing::debug;

use crate::arrange::DropOutcome;
use crate::tui::app::{App, View};

/// Translate mouse events into gesture events using the rectangles
/// recorded at the last draw.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (col, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => left_down(app, col, row),
        MouseEventKind::Drag(MouseButton::Left) => drag(app, col, row),
        MouseEventKind::Up(MouseButton::Left) => release(app),
        MouseEventKind::Down(MouseButton::Right) => right_down(app, col, row),
        _ => {}
    }
}

fn left_down(app: &mut App, col: u16, row: u16) {
    if app.form.is_some() {
        return;
    }
    if app.menu.is_open() {
        match app.hits.menu_at(col, row) {
            Some(action) => app.choose(action),
            None => app.menu.dismiss(),
        }
        return;
    }
    if let Some(view) = app.hits.tab_at(col, row) {
        app.switch_view(view);
        return;
    }
    match app.view {
        View::Grid => {
            if let Some(id) = app.hits.tile_at(col, row) {
                app.grid.pick_up(id);
            }
        }
        View::Board => {
            if let Some(id) = app.hits.card_at(col, row) {
                app.tasks.pick_up(id);
            }
        }
    }
}

fn drag(app: &mut App, col: u16, row: u16) {
    match app.view {
        View::Grid => match app.hits.tile_at(col, row) {
            Some(id) => {
                app.grid.enter(id);
            }
            None => {
                if let Some(target) = app.grid.tracker().hovered().copied() {
                    app.grid.leave(&target);
                }
            }
        },
        View::Board => match app.hits.column_at(col, row) {
            Some(group) => {
                app.tasks.enter(group);
            }
            None => {
                if let Some(target) = app.tasks.tracker().hovered().cloned() {
                    app.tasks.leave(&target);
                }
            }
        },
    }
}

fn release(app: &mut App) {
    let outcome = match app.view {
        View::Grid => app.grid.drop(),
        View::Board => app.tasks.drop(),
    };
    match outcome {
        DropOutcome::Submitted(request) => app.outbox.push(request),
        DropOutcome::Aborted(err) => debug!(%err, "drop aborted"),
        DropOutcome::NoTarget | DropOutcome::Unchanged => {}
    }
}

fn right_down(app: &mut App, col: u16, row: u16) {
    if app.form.is_some() || app.view != View::Board || app.tasks.tracker().is_active() {
        return;
    }
    match app.hits.card_at(col, row) {
        Some(id) => app.open_menu(id, (col, row)),
        None => app.menu.dismiss(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuAction;
    use crate::model::{GroupId, ItemId};
    use crate::sync::SyncCall;
    use crate::tui::render::test_helpers::sample_app;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use ratatui::layout::Rect;

    fn event(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn drag_tile_onto_tile() {
        let mut app = sample_app();
        app.take_outbox();
        app.hits.tiles = vec![
            (ItemId(1), Rect::new(0, 0, 10, 3)),
            (ItemId(2), Rect::new(10, 0, 10, 3)),
        ];
        handle_mouse(&mut app, event(MouseEventKind::Down(MouseButton::Left), 2, 1));
        handle_mouse(&mut app, event(MouseEventKind::Drag(MouseButton::Left), 5, 1));
        handle_mouse(&mut app, event(MouseEventKind::Drag(MouseButton::Left), 12, 1));
        assert!(app.grid.tree().node(ItemId(2)).unwrap().highlighted);
        handle_mouse(&mut app, event(MouseEventKind::Up(MouseButton::Left), 12, 1));

        let outbox = app.take_outbox();
        assert_eq!(outbox.len(), 1);
        let SyncCall::SetOrder(order) = &outbox[0].call else {
            panic!("expected SetOrder");
        };
        assert_eq!(order[..2], [ItemId(2), ItemId(1)]);
    }

    #[test]
    fn dragging_off_targets_clears_hover() {
        let mut app = sample_app();
        app.take_outbox();
        app.view = View::Board;
        app.hits.cards = vec![(ItemId(1), Rect::new(0, 2, 20, 2))];
        app.hits.columns = vec![
            (GroupId::new("todo"), Rect::new(0, 1, 20, 10)),
            (GroupId::new("done"), Rect::new(40, 1, 20, 10)),
        ];
        handle_mouse(&mut app, event(MouseEventKind::Down(MouseButton::Left), 1, 2));
        handle_mouse(&mut app, event(MouseEventKind::Drag(MouseButton::Left), 45, 3));
        assert_eq!(app.tasks.tracker().hovered(), Some(&GroupId::new("done")));
        handle_mouse(&mut app, event(MouseEventKind::Drag(MouseButton::Left), 30, 3));
        assert_eq!(app.tasks.tracker().hovered(), None);
        handle_mouse(&mut app, event(MouseEventKind::Up(MouseButton::Left), 30, 3));
        assert!(app.take_outbox().is_empty());
        assert_eq!(
            app.tasks.collection().group_of(ItemId(1)),
            Some(&GroupId::new("todo"))
        );
    }

    #[test]
    fn right_click_opens_menu_and_other_click_dismisses() {
        let mut app = sample_app();
        app.view = View::Board;
        app.hits.cards = vec![(ItemId(3), Rect::new(0, 2, 20, 2))];
        handle_mouse(&mut app, event(MouseEventKind::Down(MouseButton::Right), 4, 3));
        assert_eq!(app.menu.selected(), Some(ItemId(3)));

        app.hits.menu = vec![(MenuAction::Edit, Rect::new(4, 4, 10, 1))];
        handle_mouse(&mut app, event(MouseEventKind::Down(MouseButton::Left), 30, 9));
        assert!(!app.menu.is_open());

        handle_mouse(&mut app, event(MouseEventKind::Down(MouseButton::Right), 4, 3));
        handle_mouse(&mut app, event(MouseEventKind::Down(MouseButton::Left), 5, 4));
        assert_eq!(app.form.as_ref().map(|f| f.item), Some(ItemId(3)));
    }
}
