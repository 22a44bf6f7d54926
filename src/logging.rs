use crate::config::LiveExportConfig;
use crate::error::{LiveExportError, Result};
use std::path::PathBuf;
use std::sync::Once;
use tracing::{error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*, registry::Registry};

static LOGGER_INIT: Once = Once::new();

/// Initialize the logging system; later calls are ignored
pub fn init_logging(config: &LiveExportConfig, verbose: bool) -> Result<()> {
    let mut init_result = Ok(());

    LOGGER_INIT.call_once(|| {
        init_result = init_logging_internal(config, verbose);
    });

    init_result
}

/// Internal logging initialization (only called once)
fn init_logging_internal(config: &LiveExportConfig, verbose: bool) -> Result<()> {
    let log_level = if verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };

    let log_dir = if config.logging.file_enabled {
        let dir = match &config.logging.file_path {
            Some(path) => PathBuf::from(path),
            None => std::env::current_dir()?.join(".live-export").join("logs"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| {
            LiveExportError::ConfigError(format!("Failed to create log directory: {e}"))
        })?;

        Some(dir)
    } else {
        None
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log_level))
        .map_err(|e| LiveExportError::ConfigError(format!("Invalid log level '{log_level}': {e}")))?;

    let registry = Registry::default().with(filter);

    if let Some(ref dir) = log_dir {
        let file_appender = tracing_appender::rolling::never(dir, "live-export.log");
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        registry.with(file_layer).with(stderr_layer).init();
    } else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        registry.with(stderr_layer).init();
    }

    info!("Logging initialized with level: {}", log_level);
    if let Some(ref dir) = log_dir {
        info!("Log file: {}", dir.join("live-export.log").display());
    }

    Ok(())
}

/// Log a structured message for server lifecycle operations
pub fn log_server_event(event: &str, details: &str) {
    info!(target: "server", event = event, details = details);
}

/// Log a structured message for export operations
pub fn log_export_event(artifact: &str, event: &str, details: &str) {
    info!(target: "export", artifact = artifact, event = event, details = details);
}

/// Log an error with context
pub fn log_error(component: &str, error: &str, context: Option<&str>) {
    if let Some(ctx) = context {
        error!(component = component, error = error, context = ctx);
    } else {
        error!(component = component, error = error);
    }
}

/// Log a warning with context
pub fn log_warning(component: &str, warning: &str, context: Option<&str>) {
    if let Some(ctx) = context {
        warn!(component = component, warning = warning, context = ctx);
    } else {
        warn!(component = component, warning = warning);
    }
}
