#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LiveExportError;
    use crate::export::traits::MockSceneExporter;
    use mockall::Sequence;
    use std::path::PathBuf;

    fn paths() -> Arc<ExportPaths> {
        Arc::new(ExportPaths::new("/tmp/out", 0))
    }

    #[tokio::test]
    async fn test_texture_is_exported_before_scene() {
        let mut exporter = MockSceneExporter::new();
        let mut seq = Sequence::new();

        exporter
            .expect_export_environment_texture()
            .withf(|path| path == Path::new("/tmp/out/environment_texture.jpg"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(TextureExport::Written));
        exporter
            .expect_export_scene()
            .withf(|path| path == Path::new("/tmp/out/blender_live_scene.glb"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let trigger = ExportTrigger::new(paths(), Arc::new(exporter));
        let report = trigger.run_exports().await;

        assert_eq!(
            report.texture,
            ExportOutcome::Written {
                path: PathBuf::from("/tmp/out/environment_texture.jpg")
            }
        );
        assert_eq!(
            report.scene,
            ExportOutcome::Written {
                path: PathBuf::from("/tmp/out/blender_live_scene.glb")
            }
        );
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_scene_failure_does_not_skip_texture() {
        let mut exporter = MockSceneExporter::new();
        exporter
            .expect_export_environment_texture()
            .times(1)
            .returning(|_| Ok(TextureExport::Written));
        exporter
            .expect_export_scene()
            .times(1)
            .returning(|_| Err(LiveExportError::ExportError("encoder crashed".to_string())));

        let trigger = ExportTrigger::new(paths(), Arc::new(exporter));
        trigger.on_save(&SaveEvent::new(None)).await;

        let report = trigger.last_report().unwrap();
        assert!(matches!(report.texture, ExportOutcome::Written { .. }));
        assert_eq!(
            report.scene,
            ExportOutcome::Failed {
                error: "Export error: encoder crashed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_texture_failure_still_exports_scene() {
        let mut exporter = MockSceneExporter::new();
        exporter
            .expect_export_environment_texture()
            .times(1)
            .returning(|_| Err(LiveExportError::ExportError("image save failed".to_string())));
        exporter.expect_export_scene().times(1).returning(|_| Ok(()));

        let trigger = ExportTrigger::new(paths(), Arc::new(exporter));
        let report = trigger.run_exports().await;

        assert!(report.texture.is_failure());
        assert!(matches!(report.scene, ExportOutcome::Written { .. }));
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_missing_texture_is_a_skip() {
        let mut exporter = MockSceneExporter::new();
        exporter
            .expect_export_environment_texture()
            .times(1)
            .returning(|_| {
                Ok(TextureExport::Skipped {
                    reason: "world has no environment texture".to_string(),
                })
            });
        exporter.expect_export_scene().times(1).returning(|_| Ok(()));

        let trigger = ExportTrigger::new(paths(), Arc::new(exporter));
        let report = trigger.run_exports().await;

        assert_eq!(
            report.texture,
            ExportOutcome::Skipped {
                reason: "world has no environment texture".to_string()
            }
        );
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_every_save_runs_exports() {
        let mut exporter = MockSceneExporter::new();
        exporter
            .expect_export_environment_texture()
            .times(3)
            .returning(|_| Ok(TextureExport::Written));
        exporter.expect_export_scene().times(3).returning(|_| Ok(()));

        let trigger = ExportTrigger::new(paths(), Arc::new(exporter));
        assert!(trigger.last_report().is_none());

        for _ in 0..3 {
            trigger.on_save(&SaveEvent::new(None)).await;
        }
        assert!(trigger.last_report().is_some());
    }
}

use crate::config::ExportPaths;
use crate::export::traits::{ExportOutcome, ExportReport, SceneExporter, TextureExport};
use crate::host::{SaveEvent, SaveHandler};
use crate::logging::{log_error, log_export_event};
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Save handler that regenerates the served artifacts.
///
/// Runs the environment texture first, then the scene. Failures are logged
/// and recorded in the report; they never reach the host.
pub struct ExportTrigger {
    paths: Arc<ExportPaths>,
    exporter: Arc<dyn SceneExporter>,
    last_report: Mutex<Option<ExportReport>>,
}

impl ExportTrigger {
    pub fn new(paths: Arc<ExportPaths>, exporter: Arc<dyn SceneExporter>) -> Self {
        Self {
            paths,
            exporter,
            last_report: Mutex::new(None),
        }
    }

    /// Report of the most recent export run, if any
    pub fn last_report(&self) -> Option<ExportReport> {
        match self.last_report.lock() {
            Ok(report) => report.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Export both artifacts, attempting each one independently
    pub async fn run_exports(&self) -> ExportReport {
        let started_at = Utc::now();

        // The scene may reference the texture file, so it goes second
        let texture = self.export_texture(&self.paths.texture_path).await;
        let scene = self.export_scene(&self.paths.scene_path).await;

        let report = ExportReport {
            texture,
            scene,
            started_at,
            finished_at: Utc::now(),
        };

        match self.last_report.lock() {
            Ok(mut last) => *last = Some(report.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(report.clone()),
        }

        report
    }

    async fn export_texture(&self, path: &Path) -> ExportOutcome {
        match self.exporter.export_environment_texture(path).await {
            Ok(TextureExport::Written) => {
                log_export_event(
                    "environment_texture",
                    "written",
                    &path.display().to_string(),
                );
                info!("Environment texture exported to {}", path.display());
                ExportOutcome::Written {
                    path: path.to_path_buf(),
                }
            }
            Ok(TextureExport::Skipped { reason }) => {
                info!("Environment texture skipped: {}", reason);
                ExportOutcome::Skipped { reason }
            }
            Err(e) => {
                log_error(
                    "export",
                    &format!("Failed to export environment texture: {e}"),
                    Some(&path.display().to_string()),
                );
                ExportOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn export_scene(&self, path: &Path) -> ExportOutcome {
        match self.exporter.export_scene(path).await {
            Ok(()) => {
                log_export_event("scene", "written", &path.display().to_string());
                info!("Scene exported to {}", path.display());
                ExportOutcome::Written {
                    path: path.to_path_buf(),
                }
            }
            Err(e) => {
                log_error(
                    "export",
                    &format!("Failed to export scene: {e}"),
                    Some(&path.display().to_string()),
                );
                ExportOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl SaveHandler for ExportTrigger {
    async fn on_save(&self, event: &SaveEvent) {
        debug!(
            "Save event for {:?} at {}, exporting",
            event.document, event.saved_at
        );
        let report = self.run_exports().await;
        if report.has_failures() {
            debug!("Export run finished with failures");
        }
    }
}
