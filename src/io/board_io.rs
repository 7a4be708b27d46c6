use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::io::lock::LockError;
use crate::model::{BoardConfig, BoardInfo, GroupConfig, GroupId, ItemId, Tile};

/// Per-board data directory under the board root
pub const DATA_DIR: &str = ".tileboard";
pub const CONFIG_FILE: &str = "board.toml";

/// Error type for board and store I/O
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a tileboard: no .tileboard/board.toml found")]
    NotABoard,
    #[error("board already initialized at {0} (use --force to reinitialize)")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse board.toml: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("could not serialize board.toml: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
    #[error("malformed store: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// A discovered board: its root, its data directory and its configuration
#[derive(Debug, Clone)]
pub struct Board {
    pub root: PathBuf,
    pub dir: PathBuf,
    pub config: BoardConfig,
}

/// Walk up from `start` looking for `.tileboard/board.toml`.
pub fn discover_board(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(DATA_DIR).join(CONFIG_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(StoreError::NotABoard);
        }
    }
}

pub fn load_board(root: &Path) -> Result<Board, StoreError> {
    let dir = root.join(DATA_DIR);
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.is_file() {
        return Err(StoreError::NotABoard);
    }
    let text = fs::read_to_string(&config_path).map_err(|source| StoreError::Read {
        path: config_path.clone(),
        source,
    })?;
    let config: BoardConfig = toml::from_str(&text)?;
    tracing::debug!(root = %root.display(), groups = config.groups.len(), tiles = config.tiles.len(), "board loaded");
    Ok(Board {
        root: root.to_path_buf(),
        dir,
        config,
    })
}

/// Discover from `start` (or the current directory) and load.
pub fn open_board(start: Option<&Path>) -> Result<Board, StoreError> {
    let start = match start {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let root = discover_board(&start)?;
    load_board(&root)
}

/// Create `.tileboard/` under `root` with the default configuration and an
/// empty store.
pub fn init_board(root: &Path, name: &str, force: bool) -> Result<Board, StoreError> {
    let dir = root.join(DATA_DIR);
    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() && !force {
        return Err(StoreError::AlreadyInitialized(root.to_path_buf()));
    }
    fs::create_dir_all(&dir)?;

    let config = default_config(name);
    atomic_write(&config_path, toml::to_string_pretty(&config)?.as_bytes())?;
    crate::io::store::FileStore::reset(&dir)?;
    tracing::info!(root = %root.display(), "board initialized");

    Ok(Board {
        root: root.to_path_buf(),
        dir,
        config,
    })
}

pub fn default_config(name: &str) -> BoardConfig {
    const LABELS: [&str; 12] = [
        "Tasks", "Courses", "Forum", "Pomodoro", "Profile", "Feedback", "Calendar", "Mail",
        "Notes", "Library", "Grades", "Settings",
    ];
    let group = |id: &str, name: &str, accepts_from: Option<&[&str]>| GroupConfig {
        id: GroupId::new(id),
        name: name.to_string(),
        accepts_from: accepts_from.map(|ids| ids.iter().map(|g| GroupId::new(*g)).collect()),
    };
    BoardConfig {
        board: BoardInfo {
            name: name.to_string(),
        },
        groups: vec![
            group("todo", "To Do", None),
            group("in_progress", "In Progress", None),
            group("done", "Done", None),
        ],
        tiles: LABELS
            .iter()
            .zip(1u64..)
            .map(|(label, id)| Tile {
                id: ItemId(id),
                label: label.to_string(),
                target: String::new(),
            })
            .collect(),
        sync: Default::default(),
        ui: Default::default(),
    }
}

/// Write via a temp file in the same directory, then rename over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
