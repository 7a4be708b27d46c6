use clap::Parser;
use tileboard::cli::commands::{Cli, Commands};
use tileboard::cli::handlers;
use tileboard::io::board_io;
use tileboard::logging;

fn main() {
    let cli = Cli::parse();
    let board_dir = cli.board_dir.clone();

    match cli.command {
        None => {
            // No subcommand → launch TUI
            let log = board_io::open_board(board_dir.as_deref())
                .ok()
                .and_then(|board| logging::init(&board.dir));
            let result = tileboard::tui::run(board_dir.as_deref());
            drop(log);
            if let Err(e) = result {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Init(args)) => {
            // Init is handled before board discovery
            if let Err(e) = handlers::cmd_init(args, board_dir.as_deref()) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(_) => {
            if let Err(e) = handlers::dispatch(cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
