use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::{GroupId, ItemId};
use super::item::Tile;

/// Configuration from board.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub board: BoardInfo,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    #[serde(default)]
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardInfo {
    pub name: String,
}

/// One column of the task board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub id: GroupId,
    pub name: String,
    /// Groups a card may arrive from. Absent means any group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepts_from: Option<Vec<GroupId>>,
}

impl GroupConfig {
    pub fn accepts(&self, from: &GroupId) -> bool {
        self.accepts_from
            .as_ref()
            .is_none_or(|allowed| allowed.contains(from))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Artificial delay before every store call, in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl BoardConfig {
    pub fn group(&self, id: &GroupId) -> Option<&GroupConfig> {
        self.groups.iter().find(|g| &g.id == id)
    }

    pub fn group_ids(&self) -> Vec<GroupId> {
        self.groups.iter().map(|g| g.id.clone()).collect()
    }

    /// Display name for a group, falling back to its id
    pub fn group_name<'a>(&'a self, id: &'a GroupId) -> &'a str {
        self.group(id).map_or(id.as_str(), |g| g.name.as_str())
    }

    pub fn tile(&self, id: ItemId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn tile_ids(&self) -> Vec<ItemId> {
        self.tiles.iter().map(|t| t.id).collect()
    }
}
