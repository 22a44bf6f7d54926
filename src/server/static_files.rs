use crate::config::ExportPaths;
use crate::error::{LiveExportError, Result};
use crate::logging::log_server_event;
use crate::server::listing;
use axum::Router;
use axum::extract::Request;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

/// Whether the server currently owns a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerState {
    Stopped,
    Running,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerState::Stopped => write!(f, "stopped"),
            ServerState::Running => write!(f, "running"),
        }
    }
}

/// Handle to a bound listener and the task serving it
struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

/// Serves the export root over plain HTTP.
///
/// Existing files are returned as-is with a content type guessed from the
/// extension; directories get their `index.html` or a generated listing.
pub struct StaticFileServer {
    paths: Arc<ExportPaths>,
    shutdown_grace: Duration,
    running: Option<RunningServer>,
}

impl StaticFileServer {
    pub fn new(paths: Arc<ExportPaths>) -> Self {
        Self {
            paths,
            shutdown_grace: Duration::from_secs(2),
            running: None,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.set_shutdown_grace(grace);
        self
    }

    pub fn set_shutdown_grace(&mut self, grace: Duration) {
        self.shutdown_grace = grace;
    }

    pub fn state(&self) -> ServerState {
        if self.running.is_some() {
            ServerState::Running
        } else {
            ServerState::Stopped
        }
    }

    /// Address actually bound, which differs from the configured one for port 0
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Bind the listener and spawn the serving task.
    ///
    /// Returns as soon as the socket is bound. Starting a running server is a no-op.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if let Some(running) = &self.running {
            return Ok(running.local_addr);
        }

        check_root_dir(&self.paths.root_dir).await?;

        let addr = self.paths.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| LiveExportError::BindError {
                address: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let app = router(self.paths.root_dir.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let graceful = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });

            if let Err(e) = graceful.await {
                error!("HTTP server error: {}", e);
            }
        });

        log_server_event("started", &local_addr.to_string());
        info!(
            "Serving {} at http://localhost:{}",
            self.paths.root_dir.display(),
            local_addr.port()
        );

        self.running = Some(RunningServer {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task,
        });
        Ok(local_addr)
    }

    /// Stop accepting, release the port and wait for in-flight requests.
    ///
    /// Requests still running after the grace period are dropped. Stopping a
    /// server that never started is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };

        if let Some(tx) = running.shutdown_tx.take() {
            let _ = tx.send(());
        }

        match tokio::time::timeout(self.shutdown_grace, &mut running.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("HTTP server task ended abnormally: {}", e);
            }
            Err(_) => {
                warn!(
                    "HTTP server did not drain within {:?}, closing remaining connections",
                    self.shutdown_grace
                );
                running.task.abort();
                let _ = (&mut running.task).await;
            }
        }

        log_server_event("stopped", &running.local_addr.to_string());
        info!("HTTP server stopped");
        Ok(())
    }
}

// Covers dropping the server as well as a `stop` cancelled mid-drain
impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.task.abort();
    }
}

/// Router serving `root`, falling back to a directory listing
pub fn router(root: PathBuf) -> Router {
    let listing_root = root.clone();
    let listing = tower::service_fn(move |request: Request| {
        let root = listing_root.clone();
        let request_path = request.uri().path().to_string();
        async move {
            Ok::<_, Infallible>(listing::directory_listing(&root, &request_path).await)
        }
    });

    let files = ServeDir::new(root)
        .append_index_html_on_directories(true)
        .fallback(listing);

    Router::new().fallback_service(files)
}

async fn check_root_dir(root: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(root).await.map_err(|e| {
        LiveExportError::RootDirError(format!("Cannot access {}: {e}", root.display()))
    })?;

    if !metadata.is_dir() {
        return Err(LiveExportError::RootDirError(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let _entries = tokio::fs::read_dir(root).await.map_err(|e| {
        LiveExportError::RootDirError(format!("Cannot read {}: {e}", root.display()))
    })?;

    Ok(())
}
