use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A "document saved" notification from the host application
#[derive(Debug, Clone)]
pub struct SaveEvent {
    /// The saved document, when the host knows it
    pub document: Option<PathBuf>,
    pub saved_at: DateTime<Utc>,
}

impl SaveEvent {
    pub fn new(document: Option<PathBuf>) -> Self {
        Self {
            document,
            saved_at: Utc::now(),
        }
    }
}

/// Callback invoked after the host has saved the document.
///
/// Handlers must not fail: whatever goes wrong inside them is theirs to log.
#[async_trait]
pub trait SaveHandler: Send + Sync {
    async fn on_save(&self, event: &SaveEvent);
}

/// Host capability for installing and removing save handlers.
///
/// Handlers are identified by pointer, so the same `Arc` must be passed to
/// `unregister` that was passed to `register`.
pub trait SaveEventSource: Send + Sync {
    fn register(&self, handler: Arc<dyn SaveHandler>);

    /// Returns whether the handler was registered
    fn unregister(&self, handler: &Arc<dyn SaveHandler>) -> bool;

    fn is_registered(&self, handler: &Arc<dyn SaveHandler>) -> bool;
}

/// In-process handler list, dispatched in registration order
#[derive(Default)]
pub struct SaveHandlers {
    handlers: RwLock<Vec<Arc<dyn SaveHandler>>>,
}

impl SaveHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handlers.read().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every registered handler for one save.
    ///
    /// Handlers unregistered while the dispatch is in progress are skipped.
    pub async fn dispatch(&self, event: &SaveEvent) {
        // Snapshot so handlers can (un)register without deadlocking the list
        let handlers: Vec<Arc<dyn SaveHandler>> = match self.handlers.read() {
            Ok(handlers) => handlers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        debug!(
            "Dispatching save event for {:?} to {} handler(s)",
            event.document,
            handlers.len()
        );

        for handler in handlers {
            // An earlier handler may have taken a later one out of the list
            if !self.is_registered(&handler) {
                continue;
            }
            handler.on_save(event).await;
        }
    }
}

impl SaveEventSource for SaveHandlers {
    fn register(&self, handler: Arc<dyn SaveHandler>) {
        let mut handlers = match self.handlers.write() {
            Ok(handlers) => handlers,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !handlers.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            handlers.push(handler);
        }
    }

    fn unregister(&self, handler: &Arc<dyn SaveHandler>) -> bool {
        let mut handlers = match self.handlers.write() {
            Ok(handlers) => handlers,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = handlers.len();
        handlers.retain(|h| !Arc::ptr_eq(h, handler));
        handlers.len() != before
    }

    fn is_registered(&self, handler: &Arc<dyn SaveHandler>) -> bool {
        match self.handlers.read() {
            Ok(handlers) => handlers.iter().any(|h| Arc::ptr_eq(h, handler)),
            Err(poisoned) => poisoned.into_inner().iter().any(|h| Arc::ptr_eq(h, handler)),
        }
    }
}
