mod form;
mod mouse;

use crossterm::event::{KeyCode, KeyEvent};

use super::app::App;
use crate::menu::MenuAction;

pub use mouse::handle_mouse;

/// Handle a key press. The edit form and the context menu take input
/// before the main bindings.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    if app.form.is_some() {
        form::handle_form_key(app, key);
        return;
    }

    if app.menu.is_open() {
        match key.code {
            KeyCode::Char(c) => {
                if let Some(action) = MenuAction::ALL.into_iter().find(|a| a.key() == c) {
                    app.choose(action);
                } else {
                    app.menu.dismiss();
                }
            }
            _ => app.menu.dismiss(),
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.grid.cancel();
            app.tasks.cancel();
        }
        KeyCode::Tab | KeyCode::BackTab => {
            let next = app.view.toggled();
            app.switch_view(next);
        }
        KeyCode::Char('r') => app.reload_requested = true,
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}
