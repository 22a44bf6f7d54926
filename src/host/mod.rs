pub mod events;
pub mod watcher;

pub use events::*;
pub use watcher::*;
