use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;

pub(super) fn handle_form_key(app: &mut App, key: KeyEvent) {
    let Some(form) = &mut app.form else {
        return;
    };
    match key.code {
        KeyCode::Esc => app.form = None,
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Left => form.left(),
        KeyCode::Right => form.right(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => form.insert(c),
        _ => {}
    }
}
