//! Application state and the process-wide model cache

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tracing::info;

use crate::artifact::ArtifactStore;
use crate::error::Result;
use crate::inference::PredictionEngine;
use crate::training::ResultsMetadata;

/// The deserialized model plus its optional results metadata, as held in
/// memory for the process lifetime.
pub struct LoadedModel {
    pub engine: PredictionEngine,
    pub results: Option<ResultsMetadata>,
}

/// At-most-once loader for the persisted artifact.
///
/// Concurrent first accesses are serialized by the cell, so the underlying
/// file read and deserialization happen exactly once on the success path.
/// There is no invalidation: a new model requires a process restart.
pub struct ModelCache {
    store: ArtifactStore,
    cell: OnceCell<LoadedModel>,
    loads: AtomicUsize,
}

impl ModelCache {
    pub fn new(models_dir: impl AsRef<Path>) -> Self {
        Self {
            store: ArtifactStore::new(models_dir.as_ref()),
            cell: OnceCell::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Return the loaded model, reading it from the artifact store on first
    /// access. A failed load leaves the cell empty; the caller sees the
    /// error and a later access retries.
    pub async fn get(&self) -> Result<&LoadedModel> {
        self.cell
            .get_or_try_init(|| async {
                self.loads.fetch_add(1, Ordering::SeqCst);
                let (model, results) = self.store.read()?;
                info!(
                    has_metadata = results.is_some(),
                    n_trees = model.n_trees(),
                    "Model cache populated"
                );
                Ok(LoadedModel {
                    engine: PredictionEngine::new(model),
                    results,
                })
            })
            .await
    }

    /// How many underlying artifact reads have been attempted.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

/// Shared state passed by `Arc` into every request handler.
pub struct AppState {
    pub cache: ModelCache,
}

impl AppState {
    pub fn new(models_dir: impl AsRef<Path>) -> Self {
        Self {
            cache: ModelCache::new(models_dir),
        }
    }
}
