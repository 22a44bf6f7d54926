pub mod command;
pub mod traits;
pub mod trigger;

pub use command::*;
pub use traits::*;
pub use trigger::*;
