//! Process-wide classifier cache

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::engine::Classifier;
use crate::InferenceError;

static CLASSIFIER_CACHE: OnceLock<Arc<Classifier>> = OnceLock::new();

/// Backend selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    /// Trained ONNX artifact loaded from disk
    Onnx,
    /// Rule-based classifier for development and tests
    Heuristic,
}

impl FromStr for ModelBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onnx" => Ok(ModelBackend::Onnx),
            "heuristic" => Ok(ModelBackend::Heuristic),
            other => Err(format!("unknown model backend: {other}")),
        }
    }
}

/// Default artifact location: `models/water_quality.onnx` next to the
/// running executable, falling back to the working directory.
pub fn default_model_path() -> PathBuf {
    let base = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let path = base.join("models").join("water_quality.onnx");
    info!("Default model path resolved: {}", path.display());
    path
}

/// Get the process-wide classifier handle, loading it on first call.
///
/// Subsequent calls return the cached handle without touching disk.
/// A race on first load at worst performs a redundant read; the first
/// stored handle wins and every caller converges on it.
pub fn cached_classifier(
    path: Option<&Path>,
    backend: ModelBackend,
) -> Result<Arc<Classifier>, InferenceError> {
    cached_with(|| match backend {
        ModelBackend::Heuristic => Ok(Classifier::heuristic()),
        ModelBackend::Onnx => {
            let resolved = path
                .map(Path::to_path_buf)
                .unwrap_or_else(default_model_path);
            Classifier::load(&resolved)
        }
    })
}

fn cached_with<F>(init: F) -> Result<Arc<Classifier>, InferenceError>
where
    F: FnOnce() -> Result<Classifier, InferenceError>,
{
    if let Some(handle) = CLASSIFIER_CACHE.get() {
        debug!("Using cached classifier");
        return Ok(handle.clone());
    }

    info!("Classifier cache empty, initializing");
    let loaded = Arc::new(init()?);
    Ok(CLASSIFIER_CACHE.get_or_init(|| loaded).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // These tests share the process-wide cache, so they all go through
    // the same sequence: first call initializes, later calls reuse.
    #[test]
    fn test_cache_initializes_once() {
        static LOAD_COUNT: AtomicUsize = AtomicUsize::new(0);

        let first = cached_with(|| {
            LOAD_COUNT.fetch_add(1, Ordering::SeqCst);
            Ok(Classifier::heuristic())
        })
        .unwrap();

        let second = cached_with(|| {
            LOAD_COUNT.fetch_add(1, Ordering::SeqCst);
            Ok(Classifier::heuristic())
        })
        .unwrap();

        assert!(LOAD_COUNT.load(Ordering::SeqCst) <= 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cached_classifier_returns_shared_handle() {
        let first = cached_classifier(None, ModelBackend::Heuristic).unwrap();
        let second = cached_classifier(None, ModelBackend::Heuristic).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("onnx".parse::<ModelBackend>().unwrap(), ModelBackend::Onnx);
        assert_eq!(
            "heuristic".parse::<ModelBackend>().unwrap(),
            ModelBackend::Heuristic
        );
        assert!("joblib".parse::<ModelBackend>().is_err());
    }

    #[test]
    fn test_default_model_path_shape() {
        let path = default_model_path();
        assert!(path.ends_with("models/water_quality.onnx"));
    }
}
