pub mod listing;
pub mod static_files;

pub use static_files::*;
