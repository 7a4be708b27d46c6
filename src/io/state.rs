use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const STATE_FILE: &str = ".state.json";

/// Persisted TUI state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UiState {
    /// Which view was showing ("grid" or "board")
    #[serde(default)]
    pub view: String,
}

/// Read `.state.json`; a missing or unreadable file yields `None`.
pub fn read_ui_state(data_dir: &Path) -> Option<UiState> {
    let content = fs::read_to_string(data_dir.join(STATE_FILE)).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn write_ui_state(data_dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    fs::write(data_dir.join(STATE_FILE), content)
}
