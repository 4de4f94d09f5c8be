use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use super::{Result, SnapshotError, SnapshotSource};
use crate::index::Catalog;

/// Loads a snapshot once and hands out the resulting catalog.
///
/// At most one fetch is in flight: callers arriving while a fetch runs wait
/// for it and share its outcome, success or failure.
pub struct Loader {
    source: Arc<dyn SnapshotSource>,
    state: Mutex<LoadState>,
    /// Completed fetch attempts. Read before waiting on the lock to tell
    /// whether a fetch finished while we were queued.
    attempts: AtomicU64,
}

#[derive(Default)]
struct LoadState {
    catalog: Option<Arc<Catalog>>,
    last_error: Option<SnapshotError>,
}

impl Loader {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            source,
            state: Mutex::new(LoadState::default()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Load the snapshot if it isn't loaded yet and return the catalog.
    pub async fn load(&self) -> Result<Arc<Catalog>> {
        let seen = self.attempts.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if let Some(catalog) = &state.catalog {
            return Ok(Arc::clone(catalog));
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(err) = &state.last_error {
                return Err(err.clone());
            }
        }

        let outcome = self.fetch().await;
        self.attempts.fetch_add(1, Ordering::Release);
        match outcome {
            Ok(catalog) => {
                let catalog = Arc::new(catalog);
                state.catalog = Some(Arc::clone(&catalog));
                state.last_error = None;
                Ok(catalog)
            }
            Err(e) => {
                log::warn!("Snapshot load failed: {e}");
                state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Fetch a fresh snapshot and swap it in. On failure the previously
    /// loaded catalog (if any) stays in place.
    pub async fn reload(&self) -> Result<Arc<Catalog>> {
        let mut state = self.state.lock().await;
        let outcome = self.fetch().await;
        self.attempts.fetch_add(1, Ordering::Release);
        match outcome {
            Ok(catalog) => {
                let catalog = Arc::new(catalog);
                state.catalog = Some(Arc::clone(&catalog));
                state.last_error = None;
                log::info!("Snapshot reloaded from {}", self.source.describe());
                Ok(catalog)
            }
            Err(e) => {
                log::warn!("Snapshot reload failed, keeping previous data: {e}");
                state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// The loaded catalog, if any, without fetching.
    pub async fn current(&self) -> Option<Arc<Catalog>> {
        self.state.lock().await.catalog.clone()
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    async fn fetch(&self) -> Result<Catalog> {
        let source = Arc::clone(&self.source);
        let snapshot = tokio::task::spawn_blocking(move || source.fetch())
            .await
            .map_err(|e| SnapshotError::DataUnavailable {
                location: self.source.describe(),
                message: format!("fetch task failed: {e}"),
            })??;
        Ok(Catalog::new(snapshot))
    }
}
