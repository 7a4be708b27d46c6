pub mod collection;
pub mod config;
pub mod ids;
pub mod item;

pub use collection::*;
pub use config::*;
pub use ids::*;
pub use item::*;
