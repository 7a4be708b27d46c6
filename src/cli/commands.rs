use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tb", about = concat!("tileboard v", env!("CARGO_PKG_VERSION"), " - drag-and-drop tiles and task board"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new board in the current directory
    Init(InitArgs),
    /// Show the tile order, or save a new one
    Order(OrderCmd),
    /// List tasks grouped by status
    Tasks(TasksArgs),
    /// Add a task to the first group
    Add(AddArgs),
    /// Move a task to another group
    Status(StatusArgs),
    /// Edit a task's fields
    Edit(EditArgs),
    /// Delete a task
    Delete(DeleteArgs),
    /// Open tasks due soon
    Upcoming(UpcomingArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Reinitialize even if .tileboard/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct OrderCmd {
    #[command(subcommand)]
    pub action: Option<OrderAction>,
}

#[derive(Subcommand)]
pub enum OrderAction {
    /// Save a new tile order
    Set(OrderSetArgs),
}

#[derive(Args)]
pub struct OrderSetArgs {
    /// Tile ids, first to last
    #[arg(required = true)]
    pub ids: Vec<u64>,
}

#[derive(Args)]
pub struct TasksArgs {
    /// Only this group
    #[arg(long)]
    pub group: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Course code
    pub course: String,
    /// Task title
    pub title: String,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Grade weight
    #[arg(long, value_parser = finite_number)]
    pub weight: Option<f64>,
    /// Estimated hours
    #[arg(long, value_parser = finite_number)]
    pub est: Option<f64>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Task id
    pub id: u64,
    /// Target group id
    pub group: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task id
    pub id: u64,
    #[arg(long)]
    pub course: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    /// New due date (YYYY-MM-DD); omit to keep the current one
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long, value_parser = finite_number)]
    pub weight: Option<f64>,
    /// Estimated hours
    #[arg(long, value_parser = finite_number)]
    pub est: Option<f64>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task id
    pub id: u64,
}

#[derive(Args)]
pub struct UpcomingArgs {
    /// Look-ahead window in days
    #[arg(long, default_value = "21")]
    pub days: u64,
}

/// Numbers the store can round-trip: NaN and infinities are refused
fn finite_number(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("\"{}\" is not a number", raw))?;
    if !value.is_finite() {
        return Err(format!("\"{}\" is not a finite number", raw));
    }
    Ok(value)
}
