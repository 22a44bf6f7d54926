
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live export - serve a directory and re-export the scene on every save
#[derive(Parser, Debug)]
#[command(name = "live-export")]
#[command(about = "Serves exported scenes over HTTP and regenerates them whenever the document is saved")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct CliArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to live-export.toml (defaults to the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enable live export and keep serving until quit or Ctrl+C
    Run {
        /// Document to watch for saves
        #[arg(short, long)]
        document: Option<PathBuf>,
        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory to serve and export into
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Export the scene and environment texture once, without serving
    Export {
        /// Print the export report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default live-export.toml
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliResult {
    Success(String),
    Error(String),
}

impl std::fmt::Display for CliResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliResult::Success(msg) => write!(f, "{msg}"),
            CliResult::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}
