pub mod action;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod host;
pub mod logging;
pub mod server;
#[doc(hidden)]
pub mod test_utils;

pub use action::{ActionReport, ToggleLiveExportAction};
pub use controller::{LiveExportController, LiveExportStatus, ToggleOutcome, ToggleState};
pub use error::{LiveExportError, Result};
