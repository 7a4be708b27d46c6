pub mod board_io;
pub mod lock;
pub mod state;
pub mod store;
