
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiveExportError {
    #[error("Failed to bind {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Root directory error: {0}")]
    RootDirError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Command error: {0}")]
    CommandError(String),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<toml::de::Error> for LiveExportError {
    fn from(error: toml::de::Error) -> Self {
        LiveExportError::ConfigError(error.to_string())
    }
}

impl LiveExportError {
    /// Transient failures worth retrying, e.g. a port that another process is about to release.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            LiveExportError::BindError { .. }
                | LiveExportError::IoError(_)
                | LiveExportError::TimeoutError(_)
                | LiveExportError::ExportError(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            LiveExportError::BindError { .. } => "BIND_ERROR",
            LiveExportError::RootDirError(_) => "ROOT_DIR_ERROR",
            LiveExportError::ExportError(_) => "EXPORT_ERROR",
            LiveExportError::CommandError(_) => "COMMAND_ERROR",
            LiveExportError::WatchError(_) => "WATCH_ERROR",
            LiveExportError::ConfigError(_) => "CONFIG_ERROR",
            LiveExportError::TimeoutError(_) => "TIMEOUT_ERROR",
            LiveExportError::IoError(_) => "IO_ERROR",
            LiveExportError::JsonError(_) => "JSON_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, LiveExportError>;
