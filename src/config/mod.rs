pub mod paths;
pub mod settings;

pub use paths::*;
pub use settings::*;
