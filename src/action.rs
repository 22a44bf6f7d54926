use crate::controller::{LiveExportController, ToggleOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const TOGGLE_ACTION_ID: &str = "wm.live_export_toggle";
pub const TOGGLE_ACTION_LABEL: &str = "Toggle Live Export";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportLevel {
    Info,
    Error,
}

/// Feedback shown to the user after the action runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReport {
    pub level: ReportLevel,
    pub message: String,
}

impl ActionReport {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == ReportLevel::Error
    }
}

impl fmt::Display for ActionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            ReportLevel::Info => write!(f, "{}", self.message),
            ReportLevel::Error => write!(f, "Error: {}", self.message),
        }
    }
}

/// The single UI action bound to the live-export toggle
#[derive(Clone)]
pub struct ToggleLiveExportAction {
    controller: Arc<LiveExportController>,
}

impl ToggleLiveExportAction {
    pub fn new(controller: Arc<LiveExportController>) -> Self {
        Self { controller }
    }

    pub fn id(&self) -> &'static str {
        TOGGLE_ACTION_ID
    }

    pub fn label(&self) -> &'static str {
        TOGGLE_ACTION_LABEL
    }

    pub fn controller(&self) -> &Arc<LiveExportController> {
        &self.controller
    }

    pub async fn invoke(&self) -> ActionReport {
        match self.controller.toggle().await {
            Ok(ToggleOutcome::Activated) => {
                ActionReport::info("Live export enabled. Exporting on save.")
            }
            Ok(ToggleOutcome::Deactivated) => ActionReport::info("Live export disabled."),
            Err(e) => ActionReport::error(format!("Failed to enable live export: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportPaths;
    use crate::export::MockSceneExporter;
    use crate::host::SaveHandlers;
    use std::net::{IpAddr, Ipv4Addr};
    use tempfile::TempDir;

    fn action(root: &std::path::Path, port: u16) -> ToggleLiveExportAction {
        let paths = Arc::new(
            ExportPaths::new(root, port).with_host(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        );
        let controller = LiveExportController::new(
            paths,
            Arc::new(SaveHandlers::new()),
            Arc::new(MockSceneExporter::new()),
        );
        ToggleLiveExportAction::new(Arc::new(controller))
    }

    #[test]
    fn test_action_identity() {
        let temp_dir = TempDir::new().unwrap();
        let action = action(temp_dir.path(), 0);
        assert_eq!(action.id(), "wm.live_export_toggle");
        assert_eq!(action.label(), "Toggle Live Export");
    }

    #[tokio::test]
    async fn test_invoke_reports_each_transition() {
        let temp_dir = TempDir::new().unwrap();
        let action = action(temp_dir.path(), 0);

        let enabled = action.invoke().await;
        assert_eq!(
            enabled,
            ActionReport::info("Live export enabled. Exporting on save.")
        );

        let disabled = action.invoke().await;
        assert_eq!(disabled, ActionReport::info("Live export disabled."));
    }

    #[tokio::test]
    async fn test_invoke_reports_bind_failure() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = blocker.local_addr().unwrap().port();
        let action = action(temp_dir.path(), port);

        let report = action.invoke().await;
        assert!(report.is_error());
        assert!(report.message.starts_with("Failed to enable live export:"));
        assert!(!action.controller().is_active().await);
    }
}
