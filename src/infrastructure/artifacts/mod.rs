use crate::domain::error::{AppError, Result};
use ndarray::Array1;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Standardizes a feature row the way the fitted scaler was trained to.
pub trait Transformer {
    fn transform(&self, row: &Array1<f64>) -> Result<Array1<f64>>;
}

/// Maps a scaled feature row to one scalar prediction.
pub trait Predictor {
    fn predict(&self, row: &Array1<f64>) -> Result<f64>;
}

/// Hands out the two loaded artifacts. The prediction use case depends on
/// this and the two capability traits only, never on concrete artifact types.
pub trait ArtifactProvider: Send + Sync {
    fn scaler(&self) -> Result<Arc<dyn Transformer + Send + Sync>>;
    fn model(&self) -> Result<Arc<dyn Predictor + Send + Sync>>;
}

/// Well-known locations of the two serialized artifacts.
///
/// Process-relative by default so the service can run next to the files the
/// offline fitting step produced.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join("scaler.json")
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join("ridge.json")
    }
}

/// Keeps the on-disk layout a plain JSON array (`[1.0, 2.0, ...]`) instead of
/// ndarray's versioned struct form, so the offline fitting step can dump
/// vectors directly.
mod plain_array {
    use ndarray::Array1;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(arr: &Array1<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        arr.to_vec().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Array1<f64>, D::Error> {
        Vec::<f64>::deserialize(deserializer).map(Array1::from)
    }
}

/// Fitted standardizer: per-feature mean and scale, applied element-wise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(with = "plain_array")]
    pub mean: Array1<f64>,
    #[serde(with = "plain_array")]
    pub scale: Array1<f64>,
}

impl Transformer for StandardScaler {
    fn transform(&self, row: &Array1<f64>) -> Result<Array1<f64>> {
        if row.len() != self.mean.len() || row.len() != self.scale.len() {
            return Err(AppError::PredictionFailure(format!(
                "scaler expects {} features, got {}",
                self.mean.len(),
                row.len()
            )));
        }
        Ok((row - &self.mean) / &self.scale)
    }
}

/// Fitted ridge regression: dot product with the coefficient vector plus
/// intercept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeModel {
    #[serde(with = "plain_array")]
    pub coef: Array1<f64>,
    pub intercept: f64,
}

impl Predictor for RidgeModel {
    fn predict(&self, row: &Array1<f64>) -> Result<f64> {
        if row.len() != self.coef.len() {
            return Err(AppError::PredictionFailure(format!(
                "model expects {} features, got {}",
                self.coef.len(),
                row.len()
            )));
        }
        Ok(self.coef.dot(row) + self.intercept)
    }
}

fn load_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::ArtifactNotFound(format!("{} is missing", path.display()))
        } else {
            AppError::ArtifactCorrupt(format!("failed to read {}: {e}", path.display()))
        }
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::ArtifactCorrupt(format!("failed to deserialize {}: {e}", path.display()))
    })
}

type LoadResult<T> = Result<Arc<T>>;

/// Process-wide artifact cache.
///
/// Each artifact is read and deserialized at most once per process; success
/// and failure are both memoized, and concurrent first accesses are collapsed
/// into a single load by the `OnceCell` init.
pub struct ArtifactStore {
    layout: ArtifactLayout,
    scaler: OnceCell<LoadResult<StandardScaler>>,
    model: OnceCell<LoadResult<RidgeModel>>,
    #[cfg(test)]
    scaler_loads: std::sync::atomic::AtomicUsize,
    #[cfg(test)]
    model_loads: std::sync::atomic::AtomicUsize,
}

impl ArtifactStore {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self {
            layout,
            scaler: OnceCell::new(),
            model: OnceCell::new(),
            #[cfg(test)]
            scaler_loads: std::sync::atomic::AtomicUsize::new(0),
            #[cfg(test)]
            model_loads: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn scaler_handle(&self) -> LoadResult<StandardScaler> {
        self.scaler
            .get_or_init(|| {
                #[cfg(test)]
                self.scaler_loads
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                let path = self.layout.scaler_path();
                match load_artifact::<StandardScaler>(&path) {
                    Ok(scaler) => {
                        info!(path = %path.display(), features = scaler.mean.len(), "Loaded scaler");
                        Ok(Arc::new(scaler))
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to load scaler");
                        Err(e)
                    }
                }
            })
            .clone()
    }

    pub fn model_handle(&self) -> LoadResult<RidgeModel> {
        self.model
            .get_or_init(|| {
                #[cfg(test)]
                self.model_loads
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                let path = self.layout.model_path();
                match load_artifact::<RidgeModel>(&path) {
                    Ok(model) => {
                        info!(path = %path.display(), features = model.coef.len(), "Loaded ridge model");
                        Ok(Arc::new(model))
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to load ridge model");
                        Err(e)
                    }
                }
            })
            .clone()
    }

    /// Trigger both loads eagerly. Load failures are reported per request
    /// later; this only surfaces them at startup.
    pub fn warm_up(&self) -> ArtifactStatus {
        let _ = self.scaler_handle();
        let _ = self.model_handle();
        self.status()
    }

    pub fn status(&self) -> ArtifactStatus {
        ArtifactStatus {
            scaler: ArtifactState::from_cell(&self.scaler),
            model: ArtifactState::from_cell(&self.model),
        }
    }
}

impl ArtifactProvider for ArtifactStore {
    fn scaler(&self) -> Result<Arc<dyn Transformer + Send + Sync>> {
        self.scaler_handle()
            .map(|s| s as Arc<dyn Transformer + Send + Sync>)
    }

    fn model(&self) -> Result<Arc<dyn Predictor + Send + Sync>> {
        self.model_handle()
            .map(|m| m as Arc<dyn Predictor + Send + Sync>)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactState {
    pub loaded: bool,
    pub error: Option<String>,
}

impl ArtifactState {
    fn from_cell<T>(cell: &OnceCell<LoadResult<T>>) -> Self {
        match cell.get() {
            Some(Ok(_)) => Self {
                loaded: true,
                error: None,
            },
            Some(Err(e)) => Self {
                loaded: false,
                error: Some(e.to_string()),
            },
            None => Self {
                loaded: false,
                error: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub scaler: ArtifactState,
    pub model: ArtifactState,
}

impl ArtifactStatus {
    pub fn all_loaded(&self) -> bool {
        self.scaler.loaded && self.model.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::sync::Barrier;
    use tempfile::TempDir;

    fn write_scaler(dir: &Path, mean: Array1<f64>, scale: Array1<f64>) {
        let scaler = StandardScaler { mean, scale };
        fs::write(
            dir.join("scaler.json"),
            serde_json::to_vec(&scaler).unwrap(),
        )
        .unwrap();
    }

    fn write_model(dir: &Path, coef: Array1<f64>, intercept: f64) {
        let model = RidgeModel { coef, intercept };
        fs::write(dir.join("ridge.json"), serde_json::to_vec(&model).unwrap()).unwrap();
    }

    fn identity_scaler(n: usize) -> (Array1<f64>, Array1<f64>) {
        (Array1::zeros(n), Array1::ones(n))
    }

    #[test]
    fn test_artifact_files_use_plain_json_arrays() {
        // The schema the offline fitting step writes: bare arrays, no
        // ndarray wrapper struct.
        let scaler: StandardScaler =
            serde_json::from_str(r#"{"mean": [1.0, 2.0], "scale": [0.5, 4.0]}"#).unwrap();
        assert_eq!(scaler.mean.to_vec(), vec![1.0, 2.0]);
        assert_eq!(scaler.scale.to_vec(), vec![0.5, 4.0]);

        let model: RidgeModel =
            serde_json::from_str(r#"{"coef": [1.0, -1.0], "intercept": 0.25}"#).unwrap();
        assert_eq!(model.coef.to_vec(), vec![1.0, -1.0]);
        assert_eq!(model.intercept, 0.25);

        let out = serde_json::to_string(&scaler).unwrap();
        assert_eq!(out, r#"{"mean":[1.0,2.0],"scale":[0.5,4.0]}"#);
        let out = serde_json::to_string(&model).unwrap();
        assert_eq!(out, r#"{"coef":[1.0,-1.0],"intercept":0.25}"#);
    }

    #[test]
    fn test_scaler_transform_standardizes() {
        let scaler = StandardScaler {
            mean: array![1.0, 2.0],
            scale: array![2.0, 4.0],
        };
        let out = scaler.transform(&array![3.0, 10.0]).unwrap();
        assert_eq!(out.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_scaler_shape_mismatch_fast_fails() {
        let scaler = StandardScaler {
            mean: array![0.0, 0.0],
            scale: array![1.0, 1.0],
        };
        let err = scaler.transform(&array![1.0, 2.0, 3.0]).unwrap_err();
        match err {
            AppError::PredictionFailure(msg) => {
                assert!(msg.contains("expects 2 features"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ridge_predict_is_affine() {
        let model = RidgeModel {
            coef: array![2.0, -1.0],
            intercept: 0.5,
        };
        let out = model.predict(&array![3.0, 4.0]).unwrap();
        assert_eq!(out, 2.5);
    }

    #[test]
    fn test_ridge_shape_mismatch_fast_fails() {
        let model = RidgeModel {
            coef: array![1.0, 1.0, 1.0],
            intercept: 0.0,
        };
        assert!(matches!(
            model.predict(&array![1.0]).unwrap_err(),
            AppError::PredictionFailure(_)
        ));
    }

    #[test]
    fn test_missing_file_yields_not_found() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(ArtifactLayout::new(dir.path()));
        assert!(matches!(
            store.scaler_handle().unwrap_err(),
            AppError::ArtifactNotFound(_)
        ));
    }

    #[test]
    fn test_corrupt_file_yields_corrupt() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ridge.json"), b"not json at all").unwrap();
        let store = ArtifactStore::new(ArtifactLayout::new(dir.path()));
        assert!(matches!(
            store.model_handle().unwrap_err(),
            AppError::ArtifactCorrupt(_)
        ));
    }

    #[test]
    fn test_one_missing_artifact_leaves_other_unaffected() {
        let dir = TempDir::new().unwrap();
        let (mean, scale) = identity_scaler(9);
        write_scaler(dir.path(), mean, scale);
        let store = ArtifactStore::new(ArtifactLayout::new(dir.path()));

        assert!(store.scaler_handle().is_ok());
        assert!(matches!(
            store.model_handle().unwrap_err(),
            AppError::ArtifactNotFound(_)
        ));

        let status = store.status();
        assert!(status.scaler.loaded);
        assert!(!status.model.loaded);
        assert!(status.model.error.is_some());
        assert!(!status.all_loaded());
    }

    #[test]
    fn test_load_is_memoized_not_reread() {
        let dir = TempDir::new().unwrap();
        let (mean, scale) = identity_scaler(3);
        write_scaler(dir.path(), mean, scale);
        let store = ArtifactStore::new(ArtifactLayout::new(dir.path()));

        let first = store.scaler_handle().unwrap();
        // Deleting the file proves later calls come from the cache.
        fs::remove_file(dir.path().join("scaler.json")).unwrap();
        let second = store.scaler_handle().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_load_failure_is_memoized() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(ArtifactLayout::new(dir.path()));
        assert!(store.model_handle().is_err());

        // The file appearing later must not be picked up within the process.
        write_model(dir.path(), Array1::ones(9), 0.0);
        assert!(matches!(
            store.model_handle().unwrap_err(),
            AppError::ArtifactNotFound(_)
        ));
    }

    #[test]
    fn test_concurrent_first_loads_share_one_instance() {
        let dir = TempDir::new().unwrap();
        let (mean, scale) = identity_scaler(9);
        write_scaler(dir.path(), mean, scale);
        let store = Arc::new(ArtifactStore::new(ArtifactLayout::new(dir.path())));

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let mut handles = Vec::new();
        for _ in 0..threads {
            let store = store.clone();
            let barrier = barrier.clone();
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                store.scaler_handle().unwrap()
            }));
        }

        let arcs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for other in &arcs[1..] {
            assert!(Arc::ptr_eq(&arcs[0], other));
        }
        // The racing first accesses collapsed into exactly one read.
        assert_eq!(
            store
                .scaler_loads
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[test]
    fn test_repeated_access_reads_file_once() {
        let dir = TempDir::new().unwrap();
        write_model(dir.path(), Array1::ones(9), 0.0);
        let store = ArtifactStore::new(ArtifactLayout::new(dir.path()));

        for _ in 0..5 {
            store.model_handle().unwrap();
        }
        assert_eq!(
            store.model_loads.load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[test]
    fn test_artifact_round_trips_through_json() {
        let dir = TempDir::new().unwrap();
        write_model(dir.path(), array![1.0, 2.0, 3.0], -0.25);
        let store = ArtifactStore::new(ArtifactLayout::new(dir.path()));
        let model = store.model_handle().unwrap();
        assert_eq!(model.coef.to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(model.intercept, -0.25);
    }
}
