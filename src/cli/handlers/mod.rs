mod init;
pub use init::cmd_init;

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io::{self, Board};
use crate::io::store::{FileStore, Store};
use crate::logging;
use crate::menu::parse_due;
use crate::model::{GroupId, ItemId, TaskFields, upcoming};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let board_dir = cli.board_dir.as_deref();

    match cli.command {
        None => crate::tui::run(board_dir),
        Some(cmd) => match cmd {
            // Init is handled in main.rs before board discovery
            Commands::Init(args) => cmd_init(args, board_dir),

            // Read commands
            Commands::Order(OrderCmd { action: None }) => cmd_order(board_dir, json),
            Commands::Tasks(args) => cmd_tasks(args, board_dir, json),
            Commands::Upcoming(args) => cmd_upcoming(args, board_dir, json),

            // Write commands
            Commands::Order(OrderCmd {
                action: Some(OrderAction::Set(args)),
            }) => cmd_order_set(args, board_dir, json),
            Commands::Add(args) => cmd_add(args, board_dir, json),
            Commands::Status(args) => cmd_status(args, board_dir),
            Commands::Edit(args) => cmd_edit(args, board_dir, json),
            Commands::Delete(args) => cmd_delete(args, board_dir),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An opened board, its store, and the log guard for this invocation
struct Session {
    board: Board,
    store: FileStore,
    _log: Option<WorkerGuard>,
}

fn open(board_dir: Option<&Path>) -> Result<Session, Box<dyn std::error::Error>> {
    let start = match board_dir {
        Some(dir) => Some(
            std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir.display(), e))?,
        ),
        None => None,
    };
    let board = board_io::open_board(start.as_deref())?;
    let log = logging::init(&board.dir);
    let store = FileStore::new(&board.dir, board.config.clone());
    Ok(Session {
        board,
        store,
        _log: log,
    })
}

fn parse_group(board: &Board, raw: &str) -> Result<GroupId, String> {
    let id = GroupId::new(raw);
    if board.config.group(&id).is_none() {
        let known: Vec<&str> = board.config.groups.iter().map(|g| g.id.as_str()).collect();
        return Err(format!(
            "unknown group \"{}\" (known: {})",
            raw,
            known.join(", ")
        ));
    }
    Ok(id)
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_order(board_dir: Option<&Path>, json: bool) -> CmdResult {
    let mut session = open(board_dir)?;
    let order = session.store.get_order()?;
    if json {
        return print_json(&order_to_json(&session.board.config, &order));
    }
    for line in format_order(&session.board.config, &order) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_tasks(args: TasksArgs, board_dir: Option<&Path>, json: bool) -> CmdResult {
    let mut session = open(board_dir)?;
    let only = args
        .group
        .as_deref()
        .map(|g| parse_group(&session.board, g))
        .transpose()?;
    let data = session.store.load()?;

    let groups: Vec<_> = session
        .board
        .config
        .groups
        .iter()
        .filter(|g| only.as_ref().is_none_or(|id| &g.id == id))
        .collect();

    if json {
        let out: Vec<GroupJson> = groups
            .iter()
            .map(|g| group_to_json(g, &data.tasks))
            .collect();
        return print_json(&out);
    }

    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for line in format_group_listing(group, &data.tasks) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_upcoming(args: UpcomingArgs, board_dir: Option<&Path>, json: bool) -> CmdResult {
    let mut session = open(board_dir)?;
    let data = session.store.load()?;
    let today = chrono::Local::now().date_naive();
    let due = upcoming(&data.tasks, today, args.days);

    if json {
        let out: Vec<TaskJson> = due.iter().map(|t| task_to_json(t)).collect();
        return print_json(&out);
    }
    if due.is_empty() {
        println!("nothing due in the next {} days", args.days);
    }
    for task in due {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_order_set(args: OrderSetArgs, board_dir: Option<&Path>, json: bool) -> CmdResult {
    let mut session = open(board_dir)?;
    let order: Vec<ItemId> = args.ids.into_iter().map(ItemId).collect();

    session.store.set_order(&order)?;
    tracing::info!(tiles = order.len(), "order saved from cli");
    if json {
        return print_json(&order_to_json(&session.board.config, &order));
    }
    for line in format_order(&session.board.config, &order) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_add(args: AddArgs, board_dir: Option<&Path>, json: bool) -> CmdResult {
    let mut session = open(board_dir)?;
    let title = args.title.trim();
    if title.is_empty() {
        return Err("title cannot be empty".into());
    }
    let fields = TaskFields {
        course: args.course.trim().to_string(),
        title: title.to_string(),
        due: parse_due(args.due.as_deref().unwrap_or("").trim())?,
        weight: args.weight,
        est_hours: args.est,
    };
    let task = session.store.create_item(&fields)?;
    if json {
        return print_json(&task_to_json(&task));
    }
    println!("{}", format_task_line(&task));
    Ok(())
}

fn cmd_status(args: StatusArgs, board_dir: Option<&Path>) -> CmdResult {
    let mut session = open(board_dir)?;
    let group = parse_group(&session.board, &args.group)?;
    session.store.set_status(ItemId(args.id), &group)?;
    println!(
        "#{} -> {}",
        args.id,
        session.board.config.group_name(&group)
    );
    Ok(())
}

fn cmd_edit(args: EditArgs, board_dir: Option<&Path>, json: bool) -> CmdResult {
    let mut session = open(board_dir)?;
    let id = ItemId(args.id);
    let data = session.store.load()?;
    let current = data
        .tasks
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| format!("task #{} not found", id))?;

    let mut fields = current.fields();
    if let Some(course) = args.course {
        fields.course = course.trim().to_string();
    }
    if let Some(title) = args.title {
        let title = title.trim();
        if title.is_empty() {
            return Err("title cannot be empty".into());
        }
        fields.title = title.to_string();
    }
    // Only a new due date recomputes priority
    fields.due = parse_due(args.due.as_deref().unwrap_or("").trim())?;
    if args.weight.is_some() {
        fields.weight = args.weight;
    }
    if args.est.is_some() {
        fields.est_hours = args.est;
    }

    let task = session.store.edit_item(id, &fields)?;
    if json {
        return print_json(&task_to_json(&task));
    }
    println!("{}", format_task_line(&task));
    Ok(())
}

fn cmd_delete(args: DeleteArgs, board_dir: Option<&Path>) -> CmdResult {
    let mut session = open(board_dir)?;
    session.store.delete_item(ItemId(args.id))?;
    println!("deleted #{}", args.id);
    Ok(())
}
