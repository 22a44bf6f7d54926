use crate::config::ExportPaths;
use crate::controller::LiveExportController;
use crate::export::SceneExporter;
use crate::host::SaveHandlers;
use crate::test_utils::mocks::FakeExporter;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Builder for controllers wired to an in-process save source
pub struct ControllerBuilder {
    root_dir: PathBuf,
    port: u16,
    exporter: Arc<dyn SceneExporter>,
    shutdown_grace: Duration,
}

impl ControllerBuilder {
    /// Loopback only, OS-assigned port, fake exporter
    pub fn new(root_dir: &Path) -> Self {
        Self {
            root_dir: root_dir.to_path_buf(),
            port: 0,
            exporter: Arc::new(FakeExporter::new()),
            shutdown_grace: Duration::from_millis(500),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn SceneExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn paths(&self) -> ExportPaths {
        ExportPaths::new(&self.root_dir, self.port).with_host(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    pub fn build(self) -> (Arc<LiveExportController>, Arc<SaveHandlers>) {
        let events = Arc::new(SaveHandlers::new());
        let controller = LiveExportController::new(
            Arc::new(self.paths()),
            events.clone(),
            Arc::clone(&self.exporter),
        )
        .with_shutdown_grace(self.shutdown_grace);
        (Arc::new(controller), events)
    }
}
