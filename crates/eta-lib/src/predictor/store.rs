//! Process-wide model cache
//!
//! The artifact is read on first use and kept for the lifetime of the
//! process. Later calls hand out the same instance without touching storage.

use super::pipeline::Pipeline;
use super::Predictor;
use crate::error::{ArtifactError, ArtifactLoadWarning};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info, warn};

/// Where the trained pipeline lives unless configured otherwise
pub const DEFAULT_MODEL_PATH: &str = "models/best_model.json";

/// A model ready for inference plus what happened while loading it
pub struct LoadedModel {
    pub predictor: Arc<dyn Predictor>,
    /// Set when unseen-category tolerance could not be enabled
    pub warning: Option<ArtifactLoadWarning>,
    /// SHA256 of the artifact bytes, when loaded from storage
    pub checksum: Option<String>,
    pub loaded_at: i64,
}

impl LoadedModel {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self {
            predictor,
            warning: None,
            checksum: None,
            loaded_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn model_version(&self) -> &str {
        self.predictor.model_version()
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model_version", &self.model_version())
            .field("warning", &self.warning)
            .field("checksum", &self.checksum)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

type Loader = dyn Fn() -> Result<LoadedModel, ArtifactError> + Send + Sync;

/// Lazily-initialized, read-only model holder
pub struct ModelStore {
    source: String,
    loader: Box<Loader>,
    model: OnceLock<Arc<LoadedModel>>,
    init_lock: Mutex<()>,
    load_count: AtomicU64,
}

impl ModelStore {
    /// Load the JSON pipeline at `path` on first use
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let source = path.display().to_string();
        Self::with_loader(source, move || load_pipeline(&path))
    }

    /// Use a custom loader, e.g. a stub model in tests
    pub fn with_loader<F>(source: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<LoadedModel, ArtifactError> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            loader: Box::new(loader),
            model: OnceLock::new(),
            init_lock: Mutex::new(()),
            load_count: AtomicU64::new(0),
        }
    }

    /// Return the cached model, loading it first if needed.
    ///
    /// A failed load is not cached; the next call tries again.
    pub fn load(&self) -> Result<Arc<LoadedModel>, ArtifactError> {
        if let Some(model) = self.model.get() {
            return Ok(model.clone());
        }

        // Only the first caller performs I/O
        let _guard = self.init_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = self.model.get() {
            return Ok(model.clone());
        }

        self.load_count.fetch_add(1, Ordering::Relaxed);
        let loaded = Arc::new((self.loader)()?);
        debug!(source = %self.source, "Model cached");
        Ok(self.model.get_or_init(|| loaded).clone())
    }

    /// The cached model, if one has been loaded
    pub fn get(&self) -> Option<Arc<LoadedModel>> {
        self.model.get().cloned()
    }

    /// Number of times the loader actually ran
    pub fn load_count(&self) -> u64 {
        self.load_count.load(Ordering::Relaxed)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Read and parse a pipeline artifact without modifying it
pub fn read_pipeline(path: &Path) -> Result<(Pipeline, String), ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let checksum = hex::encode(Sha256::digest(&bytes));
    let pipeline = Pipeline::from_slice(&bytes)?;
    Ok((pipeline, checksum))
}

/// Load a pipeline artifact and enable unseen-category tolerance.
///
/// Reconfiguration failure is a warning; the unmodified pipeline is still
/// returned.
pub fn load_pipeline(path: &Path) -> Result<LoadedModel, ArtifactError> {
    let (mut pipeline, checksum) = read_pipeline(path)?;

    let warning = match pipeline.tolerate_unknown_categories() {
        Ok(()) => None,
        Err(warning) => {
            warn!(
                event = "model_load_warning",
                path = %path.display(),
                reason = %warning.reason,
                "Unseen categories will not be tolerated"
            );
            Some(warning)
        }
    };

    info!(
        event = "model_loaded",
        path = %path.display(),
        model_version = %pipeline.model_version(),
        checksum = %checksum,
        "Loaded model artifact"
    );

    let mut loaded = LoadedModel::new(Arc::new(pipeline));
    loaded.warning = warning;
    loaded.checksum = Some(checksum);
    Ok(loaded)
}
