use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::board_io::{self, DATA_DIR};
use crate::io::store::DEFAULT_ORDER;

/// Infer a board name from a directory name: hyphens and underscores become
/// spaces, words are title-cased.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.collect::<String>()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cmd_init(args: InitArgs, board_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match board_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            std::fs::canonicalize(dir)?
        }
        None => std::env::current_dir()?,
    };

    // Note an enclosing board; the new one shadows it from here down
    if !args.force
        && let Some(parent) = root.parent()
        && let Ok(parent_root) = board_io::discover_board(parent)
    {
        eprintln!(
            "Note: enclosing board found at {}/",
            parent_root.join(DATA_DIR).display()
        );
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let board = board_io::init_board(&root, &name, args.force)?;

    println!("Initialized tileboard: {}", name);
    println!(
        "  {} tiles, groups: {}",
        DEFAULT_ORDER.len(),
        board
            .config
            .groups
            .iter()
            .map(|g| g.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
