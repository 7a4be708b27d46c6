//! Secondary actions on a card: the right-click menu and the edit form.

use chrono::NaiveDate;

use crate::model::{ItemId, Task, TaskFields};
use crate::util::unicode;

/// Entries of the context menu, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Edit,
    Delete,
}

impl MenuAction {
    pub const ALL: [MenuAction; 2] = [MenuAction::Edit, MenuAction::Delete];

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Edit => "Edit",
            MenuAction::Delete => "Delete",
        }
    }

    pub fn key(self) -> char {
        match self {
            MenuAction::Edit => 'e',
            MenuAction::Delete => 'd',
        }
    }
}

/// Right-click menu, bound to one item while open
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextMenu {
    open: Option<(ItemId, (u16, u16))>,
}

impl ContextMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open for `item` at screen cell `anchor`, replacing any open menu
    pub fn open(&mut self, item: ItemId, anchor: (u16, u16)) {
        self.open = Some((item, anchor));
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.open.map(|(id, _)| id)
    }

    pub fn anchor(&self) -> Option<(u16, u16)> {
        self.open.map(|(_, at)| at)
    }

    pub fn dismiss(&mut self) {
        self.open = None;
    }

    /// Close the menu and return the item `action` applies to
    pub fn choose(&mut self, action: MenuAction) -> Option<(MenuAction, ItemId)> {
        self.open.take().map(|(id, _)| (action, id))
    }
}

/// Validation failures of the edit form
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("invalid date \"{0}\" (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("{field} must be a number, got \"{value}\"")]
    InvalidNumber { field: &'static str, value: String },
}

/// One text input with a grapheme-aware cursor (byte offset)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub cursor: usize,
}

impl FormField {
    fn new(label: &'static str, value: String) -> Self {
        let cursor = value.len();
        FormField {
            label,
            value,
            cursor,
        }
    }

    /// Cursor position in display cells
    pub fn cursor_col(&self) -> usize {
        unicode::display_width(&self.value[..self.cursor])
    }
}

const COURSE: usize = 0;
const TITLE: usize = 1;
const DUE: usize = 2;
const WEIGHT: usize = 3;
const EST: usize = 4;

/// Popup form pre-filled with a task's current values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub item: ItemId,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

impl EditForm {
    pub fn for_task(task: &Task) -> Self {
        let num = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        EditForm {
            item: task.id,
            fields: vec![
                FormField::new("Course", task.course.clone()),
                FormField::new("Title", task.title.clone()),
                FormField::new(
                    "Due",
                    task.due.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                ),
                FormField::new("Weight", num(task.weight)),
                FormField::new("Est. hours", num(task.est_hours)),
            ],
            focus: TITLE,
            error: None,
        }
    }

    fn focused(&mut self) -> &mut FormField {
        &mut self.fields[self.focus]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn insert(&mut self, c: char) {
        let field = self.focused();
        field.value.insert(field.cursor, c);
        field.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        let field = self.focused();
        if let Some(prev) = unicode::prev_grapheme_boundary(&field.value, field.cursor) {
            field.value.replace_range(prev..field.cursor, "");
            field.cursor = prev;
        }
    }

    pub fn left(&mut self) {
        let field = self.focused();
        if let Some(prev) = unicode::prev_grapheme_boundary(&field.value, field.cursor) {
            field.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        let field = self.focused();
        if let Some(next) = unicode::next_grapheme_boundary(&field.value, field.cursor) {
            field.cursor = next;
        }
    }

    /// Validate and convert. On error the message is also kept for display.
    pub fn submit(&mut self) -> Result<TaskFields, FormError> {
        let result = self.parse();
        self.error = result.as_ref().err().map(ToString::to_string);
        result
    }

    fn parse(&self) -> Result<TaskFields, FormError> {
        let text = |i: usize| self.fields[i].value.trim();
        if text(TITLE).is_empty() {
            return Err(FormError::EmptyTitle);
        }
        Ok(TaskFields {
            course: text(COURSE).to_string(),
            title: text(TITLE).to_string(),
            due: parse_due(text(DUE))?,
            weight: parse_number("weight", text(WEIGHT))?,
            est_hours: parse_number("estimated hours", text(EST))?,
        })
    }
}

/// Blank means "keep the current due date"
pub fn parse_due(raw: &str) -> Result<Option<NaiveDate>, FormError> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FormError::InvalidDate(raw.to_string()))
}

fn parse_number(field: &'static str, raw: &str) -> Result<Option<f64>, FormError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = || FormError::InvalidNumber {
        field,
        value: raw.to_string(),
    };
    // NaN and infinities would be written to the store as null
    let value: f64 = raw.parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupId, Priority};
    use pretty_assertions::assert_eq;

    fn task() -> Task {
        Task {
            id: ItemId(7),
            course: "MATH2".into(),
            title: "Problem set".into(),
            due: NaiveDate::from_ymd_opt(2025, 3, 10),
            weight: Some(5.0),
            est_hours: None,
            priority: Priority::Low,
            status: GroupId::new("todo"),
        }
    }

    fn clear(form: &mut EditForm) {
        while !form.fields[form.focus].value.is_empty() {
            form.backspace();
        }
    }

    #[test]
    fn menu_binds_to_one_item() {
        let mut menu = ContextMenu::new();
        menu.open(ItemId(1), (4, 2));
        menu.open(ItemId(2), (9, 3));
        assert_eq!(menu.selected(), Some(ItemId(2)));
        assert_eq!(menu.anchor(), Some((9, 3)));
        assert_eq!(
            menu.choose(MenuAction::Delete),
            Some((MenuAction::Delete, ItemId(2)))
        );
        assert!(!menu.is_open());
        assert_eq!(menu.choose(MenuAction::Edit), None);
    }

    #[test]
    fn prefilled_form_submits_current_values() {
        let mut form = EditForm::for_task(&task());
        assert_eq!(form.fields[DUE].value, "2025-03-10");
        assert_eq!(form.submit().unwrap(), task().fields());
        assert_eq!(form.error, None);
    }

    #[test]
    fn editing_and_cursor_movement() {
        let mut form = EditForm::for_task(&task());
        form.left();
        form.left();
        form.insert('!');
        assert_eq!(form.fields[TITLE].value, "Problem s!et");
        form.right();
        form.backspace();
        assert_eq!(form.fields[TITLE].value, "Problem s!t");
        assert_eq!(form.fields[TITLE].cursor_col(), 10);
    }

    #[test]
    fn focus_wraps() {
        let mut form = EditForm::for_task(&task());
        form.focus_prev();
        form.focus_prev();
        assert_eq!(form.focus, EST);
        form.focus_next();
        assert_eq!(form.focus, COURSE);
    }

    #[test]
    fn blank_due_date_is_none() {
        let mut form = EditForm::for_task(&task());
        form.focus = DUE;
        clear(&mut form);
        assert_eq!(form.submit().unwrap().due, None);
    }

    #[test]
    fn validation_errors() {
        let mut form = EditForm::for_task(&task());
        clear(&mut form);
        assert_eq!(form.submit(), Err(FormError::EmptyTitle));
        assert_eq!(form.error.as_deref(), Some("title cannot be empty"));

        let mut form = EditForm::for_task(&task());
        form.focus = DUE;
        clear(&mut form);
        for c in "next week".chars() {
            form.insert(c);
        }
        assert_eq!(form.submit(), Err(FormError::InvalidDate("next week".into())));

        let mut form = EditForm::for_task(&task());
        form.focus = WEIGHT;
        form.insert('x');
        assert_eq!(
            form.submit(),
            Err(FormError::InvalidNumber {
                field: "weight",
                value: "5x".into()
            })
        );
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for raw in ["NaN", "inf", "-inf"] {
            let mut form = EditForm::for_task(&task());
            form.focus = EST;
            clear(&mut form);
            for c in raw.chars() {
                form.insert(c);
            }
            assert_eq!(
                form.submit(),
                Err(FormError::InvalidNumber {
                    field: "estimated hours",
                    value: raw.into()
                })
            );
        }
    }
}
