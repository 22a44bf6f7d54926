use crate::error::{LiveExportError, Result};
use crate::export::{SceneExporter, TextureExport};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

/// What a fake export call does
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Write these bytes to the requested path
    Write(Vec<u8>),
    /// Return an export error with this message
    Fail(String),
    /// Report a skip (only meaningful for the environment texture)
    Skip(String),
}

/// Shared fake exporter that records every call in order
#[derive(Debug)]
pub struct FakeExporter {
    pub scene: StdMutex<FakeBehavior>,
    pub texture: StdMutex<FakeBehavior>,
    pub calls: StdMutex<Vec<(String, PathBuf)>>, // artifact, path
}

impl FakeExporter {
    pub fn new() -> Self {
        Self {
            scene: StdMutex::new(FakeBehavior::Write(b"glTF-binary".to_vec())),
            texture: StdMutex::new(FakeBehavior::Write(b"\xFF\xD8\xFF\xE0jpeg".to_vec())),
            calls: StdMutex::new(Vec::new()),
        }
    }

    pub fn with_scene(self, behavior: FakeBehavior) -> Self {
        *self.scene.lock().unwrap() = behavior;
        self
    }

    pub fn with_texture(self, behavior: FakeBehavior) -> Self {
        *self.texture.lock().unwrap() = behavior;
        self
    }

    pub fn set_scene(&self, behavior: FakeBehavior) {
        *self.scene.lock().unwrap() = behavior;
    }

    pub fn get_calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_order(&self) -> Vec<String> {
        self.get_calls()
            .into_iter()
            .map(|(artifact, _)| artifact)
            .collect()
    }

    pub fn clear_tracking(&self) {
        self.calls.lock().unwrap().clear();
    }

    async fn perform(&self, artifact: &str, behavior: FakeBehavior, path: &Path) -> Result<bool> {
        self.calls
            .lock()
            .unwrap()
            .push((artifact.to_string(), path.to_path_buf()));

        match behavior {
            FakeBehavior::Write(bytes) => {
                tokio::fs::write(path, bytes).await?;
                Ok(true)
            }
            FakeBehavior::Fail(message) => Err(LiveExportError::ExportError(message)),
            FakeBehavior::Skip(_) => Ok(false),
        }
    }
}

impl Default for FakeExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SceneExporter for FakeExporter {
    async fn export_scene(&self, path: &Path) -> Result<()> {
        let behavior = self.scene.lock().unwrap().clone();
        self.perform("scene", behavior, path).await.map(|_| ())
    }

    async fn export_environment_texture(&self, path: &Path) -> Result<TextureExport> {
        let behavior = self.texture.lock().unwrap().clone();
        let reason = match &behavior {
            FakeBehavior::Skip(reason) => Some(reason.clone()),
            _ => None,
        };

        if self.perform("environment_texture", behavior, path).await? {
            Ok(TextureExport::Written)
        } else {
            Ok(TextureExport::Skipped {
                reason: reason.unwrap_or_default(),
            })
        }
    }
}
