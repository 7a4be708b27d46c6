use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ids::{GroupId, ItemId};

/// Days-until-due below which a task is high priority
pub const HIGH_PRIORITY_WINDOW_DAYS: i64 = 7;

/// An application shortcut on the tile grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: ItemId,
    pub label: String,
    /// Where the shortcut points (URL or command)
    #[serde(default)]
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Low,
}

impl Priority {
    /// `high` when `due` is fewer than seven days after `today`
    pub fn for_due_date(due: NaiveDate, today: NaiveDate) -> Priority {
        if (due - today).num_days() < HIGH_PRIORITY_WINDOW_DAYS {
            Priority::High
        } else {
            Priority::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Low => "low",
        }
    }
}

/// A task card on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: ItemId,
    pub course: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_hours: Option<f64>,
    #[serde(default)]
    pub priority: Priority,
    pub status: GroupId,
}

impl Task {
    /// Card header, `course - title`
    pub fn header(&self) -> String {
        if self.course.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.course, self.title)
        }
    }

    /// Current values as an edit submission
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            course: self.course.clone(),
            title: self.title.clone(),
            due: self.due,
            weight: self.weight,
            est_hours: self.est_hours,
        }
    }

    /// Apply an edit. A missing due date keeps the current due date and
    /// priority; a new one recomputes priority relative to `today`.
    pub fn apply(&mut self, fields: &TaskFields, today: NaiveDate) {
        self.course = fields.course.clone();
        self.title = fields.title.clone();
        if let Some(due) = fields.due {
            self.due = Some(due);
            self.priority = Priority::for_due_date(due, today);
        }
        self.weight = fields.weight;
        self.est_hours = fields.est_hours;
    }
}

/// Editable task fields, as submitted by the edit form or `tb edit`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    pub course: String,
    pub title: String,
    #[serde(default)]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub est_hours: Option<f64>,
}

/// Groups whose tasks still count as open work
pub const OPEN_GROUPS: [&str; 2] = ["todo", "in_progress"];

/// Open tasks due between `today` and `today + days` inclusive, soonest first
pub fn upcoming(tasks: &[Task], today: NaiveDate, days: u64) -> Vec<&Task> {
    // A window past the end of the calendar has no upper bound
    let end = today
        .checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX);
    let mut due: Vec<&Task> = tasks
        .iter()
        .filter(|t| OPEN_GROUPS.contains(&t.status.as_str()))
        .filter(|t| t.due.is_some_and(|d| d >= today && d <= end))
        .collect();
    due.sort_by_key(|t| (t.due, t.id));
    due
}
