//! Persistence service: the order and status endpoints behind every drop,
//! plus the task CRUD the context menu and CLI use.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::io::board_io::{StoreError, atomic_write};
use crate::io::lock::FileLock;
use crate::model::{BoardConfig, GroupId, ItemId, Priority, Task, TaskFields};
use crate::sync::SyncError;

pub const STORE_FILE: &str = "store.json";

/// Tile order used until a user saves one
pub const DEFAULT_ORDER: [u64; 12] = [3, 1, 11, 4, 2, 12, 8, 10, 6, 9, 5, 7];

pub fn default_order() -> Vec<ItemId> {
    DEFAULT_ORDER.iter().copied().map(ItemId).collect()
}

/// Everything needed to build both collections on load
#[derive(Debug, Clone, PartialEq)]
pub struct BoardData {
    pub order: Vec<ItemId>,
    pub tasks: Vec<Task>,
}

/// Remote persistence as seen by the sync worker and the CLI.
///
/// Semantic refusals are `SyncError::Rejected`; anything that kept the call
/// from reaching the data is `SyncError::Unreachable`.
pub trait Store {
    fn load(&mut self) -> Result<BoardData, SyncError>;
    fn get_order(&mut self) -> Result<Vec<ItemId>, SyncError>;
    fn set_order(&mut self, order: &[ItemId]) -> Result<(), SyncError>;
    fn set_status(&mut self, id: ItemId, group: &GroupId) -> Result<(), SyncError>;
    fn delete_item(&mut self, id: ItemId) -> Result<(), SyncError>;
    fn edit_item(&mut self, id: ItemId, fields: &TaskFields) -> Result<Task, SyncError>;
    fn create_item(&mut self, fields: &TaskFields) -> Result<Task, SyncError>;
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::Unreachable(err.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order: Option<Vec<ItemId>>,
    #[serde(default)]
    tasks: Vec<Task>,
}

/// JSON-file store in a board's data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    config: BoardConfig,
    today: Option<NaiveDate>,
}

impl FileStore {
    pub fn new(dir: &Path, config: BoardConfig) -> Self {
        FileStore {
            dir: dir.to_path_buf(),
            config,
            today: None,
        }
    }

    /// Pin the date used for priority calculation
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Write an empty store (no saved order, no tasks)
    pub fn reset(dir: &Path) -> Result<(), StoreError> {
        let _lock = FileLock::acquire_default(dir)?;
        write_doc(dir, &StoreDoc::default())
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    fn read(&self) -> Result<StoreDoc, SyncError> {
        let _lock = FileLock::acquire_default(&self.dir).map_err(StoreError::from)?;
        Ok(read_doc(&self.dir)?)
    }

    /// Locked read-modify-write. `f` returning an error leaves the file untouched.
    fn update<R>(
        &self,
        f: impl FnOnce(&mut StoreDoc) -> Result<R, SyncError>,
    ) -> Result<R, SyncError> {
        let _lock = FileLock::acquire_default(&self.dir).map_err(StoreError::from)?;
        let mut doc = read_doc(&self.dir)?;
        let out = f(&mut doc)?;
        write_doc(&self.dir, &doc)?;
        Ok(out)
    }
}

fn read_doc(dir: &Path) -> Result<StoreDoc, StoreError> {
    let path = dir.join(STORE_FILE);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoreDoc::default()),
        Err(source) => Err(StoreError::Read { path, source }),
    }
}

fn write_doc(dir: &Path, doc: &StoreDoc) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(doc)?;
    atomic_write(&dir.join(STORE_FILE), json.as_bytes())?;
    Ok(())
}

fn task_mut(doc: &mut StoreDoc, id: ItemId) -> Result<&mut Task, SyncError> {
    doc.tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| SyncError::rejected("Task not found"))
}

impl Store for FileStore {
    fn load(&mut self) -> Result<BoardData, SyncError> {
        let doc = self.read()?;
        Ok(BoardData {
            order: doc.order.unwrap_or_else(default_order),
            tasks: doc.tasks,
        })
    }

    fn get_order(&mut self) -> Result<Vec<ItemId>, SyncError> {
        Ok(self.read()?.order.unwrap_or_else(default_order))
    }

    fn set_order(&mut self, order: &[ItemId]) -> Result<(), SyncError> {
        let mut seen = HashSet::new();
        for &id in order {
            if self.config.tile(id).is_none() {
                return Err(SyncError::rejected(format!("Unknown tile: {}", id)));
            }
            if !seen.insert(id) {
                return Err(SyncError::rejected(format!("Duplicate tile: {}", id)));
            }
        }
        self.update(|doc| {
            doc.order = Some(order.to_vec());
            Ok(())
        })
    }

    fn set_status(&mut self, id: ItemId, group: &GroupId) -> Result<(), SyncError> {
        let Some(target) = self.config.group(group).cloned() else {
            return Err(SyncError::rejected(format!("Unknown status: {}", group)));
        };
        self.update(|doc| {
            let task = task_mut(doc, id)?;
            if &task.status == group {
                return Ok(());
            }
            if !target.accepts(&task.status) {
                return Err(SyncError::rejected(format!(
                    "Moving from {} to {} is not permitted",
                    task.status, group
                )));
            }
            task.status = group.clone();
            Ok(())
        })
    }

    fn delete_item(&mut self, id: ItemId) -> Result<(), SyncError> {
        self.update(|doc| {
            let before = doc.tasks.len();
            doc.tasks.retain(|t| t.id != id);
            if doc.tasks.len() == before {
                return Err(SyncError::rejected("Task not found"));
            }
            Ok(())
        })
    }

    fn edit_item(&mut self, id: ItemId, fields: &TaskFields) -> Result<Task, SyncError> {
        let today = self.today();
        self.update(|doc| {
            let task = task_mut(doc, id)?;
            task.apply(fields, today);
            Ok(task.clone())
        })
    }

    fn create_item(&mut self, fields: &TaskFields) -> Result<Task, SyncError> {
        let Some(first) = self.config.groups.first() else {
            return Err(SyncError::rejected("Board has no groups"));
        };
        let status = first.id.clone();
        let today = self.today();
        self.update(|doc| {
            let next = doc.tasks.iter().map(|t| t.id.0).max().unwrap_or(0) + 1;
            let task = Task {
                id: ItemId(next),
                course: fields.course.clone(),
                title: fields.title.clone(),
                due: fields.due,
                weight: fields.weight,
                est_hours: fields.est_hours,
                priority: fields
                    .due
                    .map_or(Priority::Low, |due| Priority::for_due_date(due, today)),
                status,
            };
            doc.tasks.push(task.clone());
            Ok(task)
        })
    }
}
