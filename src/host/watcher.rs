use crate::error::{LiveExportError, Result};
use crate::host::events::{SaveEvent, SaveHandlers};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Turns writes to the authoring document into save events.
///
/// Editors usually save through a temp file plus rename, which produces a
/// burst of events; a burst is collapsed into one save after `debounce`.
pub struct DocumentWatcher {
    document: PathBuf,
    debounce: Duration,
    watcher: Option<RecommendedWatcher>,
    event_receiver: Option<mpsc::Receiver<std::result::Result<Event, notify::Error>>>,
}

impl DocumentWatcher {
    pub fn new(document: impl Into<PathBuf>, debounce: Duration) -> Self {
        Self {
            document: document.into(),
            debounce,
            watcher: None,
            event_receiver: None,
        }
    }

    /// Start watching the directory that holds the document
    pub fn start(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::channel::<std::result::Result<Event, notify::Error>>(100);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.blocking_send(res) {
                    error!("Failed to send file system event: {}", e);
                }
            },
            Config::default(),
        )
        .map_err(|e| LiveExportError::WatchError(format!("Failed to create file watcher: {e}")))?;

        // The parent directory survives rename-based saves, the file itself does not
        let watch_dir = self.watch_dir();
        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                LiveExportError::WatchError(format!(
                    "Failed to watch directory {}: {}",
                    watch_dir.display(),
                    e
                ))
            })?;

        self.watcher = Some(watcher);
        self.event_receiver = Some(rx);

        info!("Watching {} for saves", self.document.display());
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.watcher.take().is_some() {
            info!("Stopped watching {}", self.document.display());
        }
        self.event_receiver = None;
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Whether the event is a write to the watched document
    pub fn is_document_event(&self, event: &Event) -> bool {
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return false;
        }

        let Some(name) = self.document.file_name() else {
            return false;
        };
        event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(name))
    }

    /// Dispatch one save per burst of document writes until the watcher stops
    pub async fn run(&mut self, handlers: Arc<SaveHandlers>) -> Result<()> {
        let Some(mut receiver) = self.event_receiver.take() else {
            return Err(LiveExportError::WatchError(
                "Document watcher is not started".to_string(),
            ));
        };

        info!("Starting document watcher event loop");

        while let Some(event_result) = receiver.recv().await {
            match event_result {
                Ok(event) if self.is_document_event(&event) => {
                    debug!("Document write detected: {:?}", event.kind);
                    let closed = self.drain_burst(&mut receiver).await;

                    handlers
                        .dispatch(&SaveEvent::new(Some(self.document.clone())))
                        .await;

                    if closed {
                        break;
                    }
                }
                Ok(event) => {
                    debug!("Ignoring file system event: {:?}", event);
                }
                Err(e) => {
                    error!("File watcher error: {}", e);
                }
            }
        }

        info!("Document watcher event loop ended");
        Ok(())
    }

    /// Swallow events until the directory has been quiet for `debounce`.
    /// Returns true when the channel closed meanwhile.
    async fn drain_burst(
        &self,
        receiver: &mut mpsc::Receiver<std::result::Result<Event, notify::Error>>,
    ) -> bool {
        loop {
            match tokio::time::timeout(self.debounce, receiver.recv()).await {
                Ok(Some(_)) => continue,
                Ok(None) => return true,
                Err(_) => return false,
            }
        }
    }

    fn watch_dir(&self) -> PathBuf {
        match self.document.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl Drop for DocumentWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::events::{SaveEventSource, SaveHandler};
    use async_trait::async_trait;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SaveHandler for CountingHandler {
        async fn on_save(&self, _event: &SaveEvent) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_document_event_filtering() {
        let watcher = DocumentWatcher::new("/work/scene.blend", Duration::from_millis(50));

        let write = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/work/scene.blend"));
        assert!(watcher.is_document_event(&write));

        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/work/scene.blend"));
        assert!(watcher.is_document_event(&created));

        let other_file = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/work/scene.blend1"));
        assert!(!watcher.is_document_event(&other_file));

        let read = Event::new(EventKind::Access(AccessKind::Any))
            .add_path(PathBuf::from("/work/scene.blend"));
        assert!(!watcher.is_document_event(&read));
    }

    #[tokio::test]
    async fn test_watcher_start_stop() {
        let temp_dir = TempDir::new().unwrap();
        let document = temp_dir.path().join("scene.blend");
        std::fs::write(&document, b"v1").unwrap();

        let mut watcher = DocumentWatcher::new(&document, Duration::from_millis(50));
        watcher.start().unwrap();
        assert!(watcher.is_running());

        watcher.stop();
        assert!(!watcher.is_running());
    }

    #[tokio::test]
    async fn test_run_without_start_fails() {
        let mut watcher = DocumentWatcher::new("scene.blend", Duration::from_millis(50));
        let result = watcher.run(Arc::new(SaveHandlers::new())).await;
        assert!(matches!(result, Err(LiveExportError::WatchError(_))));
    }

    #[tokio::test]
    async fn test_document_write_dispatches_save() {
        let temp_dir = TempDir::new().unwrap();
        let document = temp_dir.path().join("scene.blend");
        std::fs::write(&document, b"v1").unwrap();

        let handlers = Arc::new(SaveHandlers::new());
        let counter = Arc::new(CountingHandler {
            calls: AtomicUsize::new(0),
        });
        handlers.register(counter.clone());

        let mut watcher = DocumentWatcher::new(&document, Duration::from_millis(50));
        watcher.start().unwrap();

        let loop_handlers = Arc::clone(&handlers);
        let watcher_handle = tokio::spawn(async move {
            let _ = watcher.run(loop_handlers).await;
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(&document, b"v2").unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while counter.calls.load(Ordering::SeqCst) == 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        watcher_handle.abort();
        assert!(counter.calls.load(Ordering::SeqCst) >= 1);
    }
}
