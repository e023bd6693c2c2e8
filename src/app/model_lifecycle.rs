use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use crate::domain::{AtomicModelPhase, ModelError, ModelPhase};
use crate::ports::{InferenceEngine, ModelAssets};

type Outcome = Option<Result<(), ModelError>>;

/// Ensures the recognition model is copied to local storage and loaded into
/// the engine once per process.
///
/// Concurrent callers collapse onto a single load and all observe its outcome.
/// A failure is cached until `retry` is called.
pub struct ModelLifecycle {
    inner: Arc<Inner>,
    outcome: Arc<Mutex<Outcome>>,
}

struct Inner {
    engine: Arc<dyn InferenceEngine>,
    assets: Arc<dyn ModelAssets>,
    asset_name: String,
    model_path: PathBuf,
    phase: AtomicModelPhase,
}

impl ModelLifecycle {
    /// `asset_name` is both the bundled resource name and the path of the
    /// materialized copy relative to `data_dir`.
    pub fn new(
        engine: Arc<dyn InferenceEngine>,
        assets: Arc<dyn ModelAssets>,
        asset_name: impl Into<String>,
        data_dir: &Path,
    ) -> Self {
        let asset_name = asset_name.into();
        let model_path = data_dir.join(&asset_name);

        Self {
            inner: Arc::new(Inner {
                engine,
                assets,
                asset_name,
                model_path,
                phase: AtomicModelPhase::default(),
            }),
            outcome: Arc::new(Mutex::new(None)),
        }
    }

    /// Current phase, without waiting on an in-flight load.
    pub fn phase(&self) -> ModelPhase {
        self.inner.phase.load()
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == ModelPhase::Ready
    }

    /// Where the model is materialized.
    pub fn model_path(&self) -> &Path {
        &self.inner.model_path
    }

    /// Load the model if this is the first call; otherwise return the cached outcome.
    pub async fn ensure_ready(&self) -> Result<(), ModelError> {
        if self.is_ready() {
            return Ok(());
        }

        let outcome = Arc::clone(&self.outcome).lock_owned().await;
        if let Some(result) = outcome.as_ref() {
            return result.clone();
        }

        self.run_load(outcome).await
    }

    /// Leave the Failed phase by loading again. A Ready model is left untouched.
    pub async fn retry(&self) -> Result<(), ModelError> {
        let outcome = Arc::clone(&self.outcome).lock_owned().await;
        match outcome.as_ref() {
            Some(Ok(())) => return Ok(()),
            Some(Err(previous)) => info!(previous = %previous, "Retrying model load"),
            None => {}
        }

        self.run_load(outcome).await
    }

    /// The load runs in its own task holding the outcome lock, so a caller that
    /// stops waiting cannot let a second load start while the first is in flight.
    async fn run_load(&self, mut outcome: OwnedMutexGuard<Outcome>) -> Result<(), ModelError> {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = inner.load().await;
            *outcome = Some(result.clone());
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                self.inner.phase.store(ModelPhase::Failed);
                error!(error = %e, "Model load task failed");
                Err(ModelError::LoadFailed(format!("Task join error: {}", e)))
            }
        }
    }
}

impl Inner {
    async fn load(self: Arc<Self>) -> Result<(), ModelError> {
        self.phase.store(ModelPhase::Loading);
        info!(asset = %self.asset_name, path = ?self.model_path, "Loading model");

        let result = tokio::task::spawn_blocking({
            let inner = Arc::clone(&self);
            move || {
                inner.materialize()?;
                inner
                    .engine
                    .load_model(&inner.model_path)
                    .map_err(|e| ModelError::LoadFailed(e.to_string()))
            }
        })
        .await
        .map_err(|e| ModelError::LoadFailed(format!("Task join error: {}", e)))
        .and_then(|r| r);

        match &result {
            Ok(()) => {
                self.phase.store(ModelPhase::Ready);
                info!(path = ?self.model_path, "Model ready");
            }
            Err(e) => {
                self.phase.store(ModelPhase::Failed);
                warn!(error = %e, "Model load failed");
            }
        }
        result
    }

    /// Copy the bundled asset into place unless a file already exists there.
    ///
    /// The copy is written to a sibling temp file and renamed, so an
    /// interrupted copy never leaves a truncated model that would be trusted.
    fn materialize(&self) -> Result<(), ModelError> {
        if self.model_path.exists() {
            debug!(path = ?self.model_path, "Model file already present");
            return Ok(());
        }

        let mut input = self.assets.open(&self.asset_name).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ModelError::AssetMissing(self.asset_name.clone())
            } else {
                ModelError::CopyFailed(format!("{}: {}", self.asset_name, e))
            }
        })?;

        let parent = self
            .model_path
            .parent()
            .ok_or_else(|| ModelError::CopyFailed(format!("no parent for {:?}", self.model_path)))?;
        fs::create_dir_all(parent).map_err(|e| ModelError::CopyFailed(e.to_string()))?;

        let mut file = tempfile::Builder::new()
            .prefix(".model")
            .tempfile_in(parent)
            .map_err(|e| ModelError::CopyFailed(e.to_string()))?;
        let bytes = io::copy(&mut input, &mut file).map_err(|e| ModelError::CopyFailed(e.to_string()))?;
        file.flush().map_err(|e| ModelError::CopyFailed(e.to_string()))?;
        file.persist(&self.model_path)
            .map_err(|e| ModelError::CopyFailed(e.to_string()))?;

        info!(path = ?self.model_path, size_mb = bytes / (1024 * 1024), "Model copied from assets");
        Ok(())
    }
}
