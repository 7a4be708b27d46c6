use serde::Serialize;

use crate::model::{BoardConfig, GroupConfig, ItemId, Task, Tile};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TileJson {
    pub position: usize,
    pub id: u64,
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target: String,
}

#[derive(Serialize)]
pub struct TaskJson {
    pub id: u64,
    pub course: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub est_hours: Option<f64>,
    pub priority: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct GroupJson {
    pub id: String,
    pub name: String,
    pub tasks: Vec<TaskJson>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Tiles in display order. Ids without a configured tile keep a placeholder label.
pub fn order_to_json(config: &BoardConfig, order: &[ItemId]) -> Vec<TileJson> {
    order
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let (label, target) = match config.tile(*id) {
                Some(Tile { label, target, .. }) => (label.clone(), target.clone()),
                None => (format!("tile {}", id), String::new()),
            };
            TileJson {
                position: i + 1,
                id: id.0,
                label,
                target,
            }
        })
        .collect()
}

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.0,
        course: task.course.clone(),
        title: task.title.clone(),
        due: task.due.map(|d| d.format("%Y-%m-%d").to_string()),
        weight: task.weight,
        est_hours: task.est_hours,
        priority: task.priority.as_str().to_string(),
        status: task.status.to_string(),
    }
}

pub fn group_to_json(group: &GroupConfig, tasks: &[Task]) -> GroupJson {
    GroupJson {
        id: group.id.to_string(),
        name: group.name.clone(),
        tasks: tasks
            .iter()
            .filter(|t| t.status == group.id)
            .map(task_to_json)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn format_order(config: &BoardConfig, order: &[ItemId]) -> Vec<String> {
    order_to_json(config, order)
        .into_iter()
        .map(|tile| format!("{:>3}. [{}] {}", tile.position, tile.id, tile.label))
        .collect()
}

/// `#1 CS101 - Lab 2  due 2025-03-01  high`
pub fn format_task_line(task: &Task) -> String {
    let mut line = format!("#{} {}", task.id, task.header());
    if let Some(due) = task.due {
        line.push_str(&format!("  due {}", due.format("%Y-%m-%d")));
    }
    line.push_str("  ");
    line.push_str(task.priority.as_str());
    line
}

/// Header with a count, then one indented line per task
pub fn format_group_listing(group: &GroupConfig, tasks: &[Task]) -> Vec<String> {
    let members: Vec<&Task> = tasks.iter().filter(|t| t.status == group.id).collect();
    let mut lines = vec![format!("{} ({})", group.name, members.len())];
    lines.extend(members.iter().map(|t| format!("  {}", format_task_line(t))));
    lines
}
