use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Result of asking the host for the environment texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureExport {
    Written,
    /// The document has no environment texture; not an error
    Skipped { reason: String },
}

/// Host export primitives.
///
/// Both calls are opaque to the core: the exporter owns the scene graph,
/// modifier evaluation and encoders, the core only looks at success/failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SceneExporter: Send + Sync {
    /// Write the binary scene (GLB) to `path`
    async fn export_scene(&self, path: &Path) -> Result<()>;

    /// Rasterize the world's environment texture to `path`
    async fn export_environment_texture(&self, path: &Path) -> Result<TextureExport>;
}

/// Outcome of one artifact in an export run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    Written { path: PathBuf },
    Skipped { reason: String },
    Failed { error: String },
}

impl ExportOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExportOutcome::Failed { .. })
    }
}

impl std::fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportOutcome::Written { path } => write!(f, "written to {}", path.display()),
            ExportOutcome::Skipped { reason } => write!(f, "skipped ({reason})"),
            ExportOutcome::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// What a single save produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub texture: ExportOutcome,
    pub scene: ExportOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExportReport {
    pub fn has_failures(&self) -> bool {
        self.texture.is_failure() || self.scene.is_failure()
    }
}

impl std::fmt::Display for ExportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Environment texture: {}", self.texture)?;
        write!(f, "Scene: {}", self.scene)
    }
}
