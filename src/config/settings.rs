
use crate::error::{LiveExportError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the per-project configuration file, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "live-export.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LiveExportConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    pub root_dir: Option<PathBuf>, // If None, serves the working directory
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_scene_file_name")]
    pub scene_file_name: String,
    #[serde(default = "default_texture_file_name")]
    pub texture_file_name: String,
    /// Command producing the scene export; `{output}` and `{document}` are substituted
    pub scene_command: Option<String>,
    /// Command producing the environment texture; unset means the document has none
    pub texture_command: Option<String>,
    #[serde(default = "default_export_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    pub document: Option<PathBuf>,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default)]
    pub file_enabled: bool,
    pub file_path: Option<String>, // If None, logs go under .live-export/logs in the working directory
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            root_dir: None,
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scene_file_name: default_scene_file_name(),
            texture_file_name: default_texture_file_name(),
            scene_command: None,
            texture_command: None,
            timeout_secs: default_export_timeout_secs(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            document: None,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_enabled: false,
            file_path: None,
        }
    }
}

impl LiveExportConfig {
    /// Missing file means defaults; a present file must parse and validate
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    pub async fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| LiveExportError::ConfigError(format!("Failed to serialize config: {e}")))?;

        tokio::fs::write(path, content).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(LiveExportError::ConfigError(
                "Server port must be between 1 and 65535".to_string(),
            ));
        }

        if self.server.host.parse::<std::net::IpAddr>().is_err() {
            return Err(LiveExportError::ConfigError(format!(
                "Server host must be an IP address, got '{}'",
                self.server.host
            )));
        }

        validate_file_name("scene_file_name", &self.export.scene_file_name)?;
        validate_file_name("texture_file_name", &self.export.texture_file_name)?;

        if self.export.timeout_secs == 0 {
            return Err(LiveExportError::ConfigError(
                "Export timeout must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(LiveExportError::ConfigError(format!(
                "Invalid logging level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.server.shutdown_grace_ms)
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export.timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }
}

/// Artifacts are written straight into the served root, so names must be bare file names
fn validate_file_name(field: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LiveExportError::ConfigError(format!(
            "{field} must not be empty"
        )));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(LiveExportError::ConfigError(format!(
            "{field} must be a plain file name, got '{name}'"
        )));
    }
    Ok(())
}

// Default value functions for serde
fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_shutdown_grace_ms() -> u64 {
    2000
}
fn default_scene_file_name() -> String {
    "blender_live_scene.glb".to_string()
}
fn default_texture_file_name() -> String {
    "environment_texture.jpg".to_string()
}
fn default_export_timeout_secs() -> u64 {
    120
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_log_level() -> String {
    "info".to_string()
}
