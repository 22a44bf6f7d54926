use crate::config::ExportPaths;
use crate::controller::state::{LiveExportStatus, ToggleOutcome, ToggleState};
use crate::error::Result;
use crate::export::{ExportReport, ExportTrigger, SceneExporter};
use crate::host::{SaveEventSource, SaveHandler};
use crate::logging::log_warning;
use crate::server::StaticFileServer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Mutable half of the controller; only touched while holding the lock
struct ControllerState {
    toggle: ToggleState,
    server: StaticFileServer,
}

/// Owns the live-export toggle.
///
/// Active means the export trigger is registered with the host and the file
/// server is listening; Inactive means neither. Transitions run entirely
/// under one lock, so callers never see a half-activated controller.
pub struct LiveExportController {
    paths: Arc<ExportPaths>,
    events: Arc<dyn SaveEventSource>,
    trigger: Arc<ExportTrigger>,
    // Same allocation as `trigger`, kept as the identity used for (un)registration
    handler: Arc<dyn SaveHandler>,
    state: Mutex<ControllerState>,
}

impl LiveExportController {
    pub fn new(
        paths: Arc<ExportPaths>,
        events: Arc<dyn SaveEventSource>,
        exporter: Arc<dyn SceneExporter>,
    ) -> Self {
        let trigger = Arc::new(ExportTrigger::new(Arc::clone(&paths), exporter));
        let handler: Arc<dyn SaveHandler> = trigger.clone();
        let server = StaticFileServer::new(Arc::clone(&paths));

        Self {
            paths,
            events,
            trigger,
            handler,
            state: Mutex::new(ControllerState {
                toggle: ToggleState::Inactive,
                server,
            }),
        }
    }

    /// How long deactivation waits for in-flight requests
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.state.get_mut().server.set_shutdown_grace(grace);
        self
    }

    pub fn paths(&self) -> &ExportPaths {
        &self.paths
    }

    /// Flip the toggle: activate when inactive, deactivate when active
    pub async fn toggle(&self) -> Result<ToggleOutcome> {
        let mut state = self.state.lock().await;
        match state.toggle {
            ToggleState::Inactive => {
                self.activate_locked(&mut state).await?;
                Ok(ToggleOutcome::Activated)
            }
            ToggleState::Active => {
                self.deactivate_locked(&mut state).await?;
                Ok(ToggleOutcome::Deactivated)
            }
        }
    }

    /// Register the export trigger, then start the server; rolls back on failure
    pub async fn activate(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.activate_locked(&mut state).await
    }

    /// Unregister the export trigger, then stop the server. No-op when inactive.
    pub async fn deactivate(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.deactivate_locked(&mut state).await
    }

    /// Deactivate before the process exits
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down live export");
        self.deactivate().await
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.toggle == ToggleState::Active
    }

    pub async fn status(&self) -> LiveExportStatus {
        let state = self.state.lock().await;
        LiveExportStatus {
            toggle: state.toggle,
            server: state.server.state(),
            trigger_registered: self.events.is_registered(&self.handler),
            address: state.server.local_addr(),
            last_export: self.trigger.last_report(),
        }
    }

    /// Run both exports immediately, independent of any save event
    pub async fn export_now(&self) -> ExportReport {
        self.trigger.run_exports().await
    }

    async fn activate_locked(&self, state: &mut ControllerState) -> Result<()> {
        if state.toggle == ToggleState::Active {
            debug!("Live export already active");
            return Ok(());
        }

        // Safe before the server is up: the trigger only writes files
        let registration = Registration::new(self.events.as_ref(), &self.handler);
        debug!("Export trigger registered");

        // Dropping this future before the bind completes unregisters again
        match state.server.start().await {
            Ok(addr) => {
                registration.keep();
                state.toggle = ToggleState::Active;
                info!(
                    "Live export enabled, serving {} on port {}",
                    self.paths.root_dir.display(),
                    addr.port()
                );
                Ok(())
            }
            Err(e) => {
                drop(registration);
                error!("Failed to enable live export: {}", e);
                Err(e)
            }
        }
    }

    async fn deactivate_locked(&self, state: &mut ControllerState) -> Result<()> {
        if state.toggle == ToggleState::Inactive {
            debug!("Live export already inactive");
            return Ok(());
        }

        // No export can start once the trigger is gone
        if !self.events.unregister(&self.handler) {
            log_warning(
                "controller",
                "Export trigger was not registered during deactivation",
                None,
            );
        }

        // A cancelled stop drops the running server, which aborts it
        state.toggle = ToggleState::Inactive;

        if let Err(e) = state.server.stop().await {
            log_warning("controller", &format!("Error stopping server: {e}"), None);
        }

        info!("Live export disabled");
        Ok(())
    }
}

/// Save-handler registration that is undone on drop unless kept
struct Registration<'a> {
    events: &'a dyn SaveEventSource,
    handler: &'a Arc<dyn SaveHandler>,
    kept: bool,
}

impl<'a> Registration<'a> {
    fn new(events: &'a dyn SaveEventSource, handler: &'a Arc<dyn SaveHandler>) -> Self {
        events.register(Arc::clone(handler));
        Self {
            events,
            handler,
            kept: false,
        }
    }

    fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if !self.kept {
            self.events.unregister(self.handler);
            debug!("Export trigger unregistered after incomplete activation");
        }
    }
}
