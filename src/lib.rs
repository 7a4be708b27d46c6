pub mod arrange;
pub mod cli;
pub mod gesture;
pub mod io;
pub mod logging;
pub mod menu;
pub mod model;
pub mod sync;
pub mod tui;
pub mod util;
pub mod view;
