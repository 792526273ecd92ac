//! Artifact persistence: model, feature list and results metadata
//!
//! Three named resources under one models directory. The trainer writes
//! them, the server reads them; nothing else touches the directory.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ForecastError, Result};
use crate::model::GradientBoostedRegressor;
use crate::training::ResultsMetadata;

pub const MODEL_FILE: &str = "model.bin";
pub const FEATURE_LIST_FILE: &str = "feature_list.txt";
pub const RESULTS_FILE: &str = "results.json";

/// Read/write access to the persisted artifact triple.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn feature_list_path(&self) -> PathBuf {
        self.dir.join(FEATURE_LIST_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.dir.join(RESULTS_FILE)
    }

    /// Persist the artifact triple, creating the directory if needed.
    ///
    /// Writes happen in a fixed order (model, feature list, results) but are
    /// not transactional: a crash mid-write can leave a torn artifact set.
    /// Known limitation, not auto-recovered.
    pub fn write(
        &self,
        model: &GradientBoostedRegressor,
        results: &ResultsMetadata,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let model_path = self.model_path();
        let bytes = bincode::serialize(model)
            .map_err(|e| ForecastError::SerializationError(e.to_string()))?;
        fs::write(&model_path, bytes)?;
        info!(path = %model_path.display(), "Saved model");

        let feature_path = self.feature_list_path();
        fs::write(&feature_path, results.features.join("\n"))?;
        info!(path = %feature_path.display(), "Saved feature list");

        let results_path = self.results_path();
        let file = fs::File::create(&results_path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), results)
            .map_err(|e| ForecastError::SerializationError(e.to_string()))?;
        info!(path = %results_path.display(), "Saved results metadata");

        Ok(())
    }

    /// Load the model and, when present, the results metadata.
    ///
    /// A missing model file is fatal. A missing results file is not: the
    /// model still serves, and metadata-dependent surfaces degrade.
    pub fn read(&self) -> Result<(GradientBoostedRegressor, Option<ResultsMetadata>)> {
        let model_path = self.model_path();
        if !model_path.exists() {
            return Err(ForecastError::ModelMissing(model_path));
        }

        let bytes = fs::read(&model_path)?;
        let model: GradientBoostedRegressor = bincode::deserialize(&bytes)
            .map_err(|e| ForecastError::SerializationError(format!("Corrupt model file: {e}")))?;
        info!(path = %model_path.display(), "Loaded model");

        let results_path = self.results_path();
        let results = if results_path.exists() {
            let contents = fs::read_to_string(&results_path)?;
            let parsed: ResultsMetadata = serde_json::from_str(&contents).map_err(|e| {
                ForecastError::SerializationError(format!("Corrupt results file: {e}"))
            })?;
            Some(parsed)
        } else {
            warn!(path = %results_path.display(), "Results metadata absent, serving without metrics");
            None
        };

        Ok((model, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GradientBoostingConfig;
    use crate::schema::FEATURE_COLUMNS;
    use crate::training::{EvalReport, SplitMetrics};
    use ndarray::{Array1, Array2};

    fn tiny_model() -> GradientBoostedRegressor {
        let x = Array2::from_shape_vec((30, 2), (0..60).map(|i| i as f64).collect()).unwrap();
        let y: Array1<f64> = x.rows().into_iter().map(|r| r[0] + r[1]).collect();
        let mut model = GradientBoostedRegressor::new(GradientBoostingConfig {
            n_estimators: 5,
            max_depth: 2,
            ..Default::default()
        });
        model.fit(&x, &y, None).unwrap();
        model
    }

    fn dummy_results() -> ResultsMetadata {
        let m = SplitMetrics {
            mae: 1.0,
            rmse: 2.0,
            r2: 0.5,
        };
        ResultsMetadata {
            model_type: "GradientBoosting".to_string(),
            n_features: FEATURE_COLUMNS.len(),
            features: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            hyperparameters: GradientBoostingConfig::default(),
            metrics: EvalReport {
                train: m.clone(),
                val: m.clone(),
                test: m,
            },
        }
    }

    #[test]
    fn test_write_creates_all_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write(&tiny_model(), &dummy_results()).unwrap();

        assert!(store.model_path().exists());
        assert!(store.feature_list_path().exists());
        assert!(store.results_path().exists());

        let features = fs::read_to_string(store.feature_list_path()).unwrap();
        assert_eq!(features.lines().count(), FEATURE_COLUMNS.len());
        assert_eq!(features.lines().next().unwrap(), "hour_sin");
    }

    #[test]
    fn test_missing_model_is_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.read(),
            Err(ForecastError::ModelMissing(_))
        ));
    }

    #[test]
    fn test_missing_results_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write(&tiny_model(), &dummy_results()).unwrap();
        fs::remove_file(store.results_path()).unwrap();

        let (_, results) = store.read().unwrap();
        assert!(results.is_none());
    }

    #[test]
    fn test_corrupt_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(store.model_path(), b"not a model").unwrap();

        assert!(matches!(
            store.read(),
            Err(ForecastError::SerializationError(_))
        ));
    }
}
