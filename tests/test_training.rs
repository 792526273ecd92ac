//! Integration tests: training pipeline and artifact persistence

mod common;

use demand_forecast::artifact::ArtifactStore;
use demand_forecast::data::feature_matrix;
use demand_forecast::error::ForecastError;
use demand_forecast::schema::{FEATURE_COLUMNS, N_FEATURES};
use demand_forecast::training::{metrics, train_and_evaluate};

use std::fs;
use std::path::Path;

use polars::prelude::{CsvWriter, SerWriter};

use common::{synthetic_split, synthetic_splits, test_params};

#[test]
fn test_train_produces_coherent_metadata() {
    let splits = synthetic_splits();
    let (_, results) = train_and_evaluate(&splits, test_params()).unwrap();

    assert_eq!(results.model_type, "GradientBoosting");
    assert_eq!(results.n_features, N_FEATURES);
    assert_eq!(results.features.len(), N_FEATURES);
    for (recorded, expected) in results.features.iter().zip(FEATURE_COLUMNS.iter()) {
        assert_eq!(recorded, expected);
    }
    assert_eq!(results.hyperparameters.n_estimators, 20);
}

#[test]
fn test_reported_rmse_is_sqrt_of_recomputed_mse() {
    let splits = synthetic_splits();
    let (model, results) = train_and_evaluate(&splits, test_params()).unwrap();

    for (df, reported) in [
        (&splits.train, &results.metrics.train),
        (&splits.val, &results.metrics.val),
        (&splits.test, &results.metrics.test),
    ] {
        let (x, y) = feature_matrix(df).unwrap();
        let predictions = model.predict(&x).unwrap();
        let mse = metrics::mean_squared_error(&y, &predictions);
        assert!(
            (reported.rmse - mse.sqrt()).abs() < 1e-9,
            "RMSE {} != sqrt(MSE) {}",
            reported.rmse,
            mse.sqrt()
        );
    }
}

#[test]
fn test_model_learns_the_target() {
    let splits = synthetic_splits();
    let (_, results) = train_and_evaluate(&splits, test_params()).unwrap();

    // The synthetic target is a clean function of two lag features, so the
    // fit should explain most of the training variance.
    assert!(results.metrics.train.r2 > 0.5, "R² = {}", results.metrics.train.r2);
}

#[test]
fn test_artifact_round_trip_preserves_predictions() {
    let splits = synthetic_splits();
    let (model, results) = train_and_evaluate(&splits, test_params()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    store.write(&model, &results).unwrap();
    let (reloaded, reloaded_results) = store.read().unwrap();

    let (x, _) = feature_matrix(&splits.test).unwrap();
    let before = model.predict(&x).unwrap();
    let after = reloaded.predict(&x).unwrap();
    assert_eq!(before, after, "reloaded model must predict bit-for-bit identically");

    let meta = reloaded_results.unwrap();
    assert_eq!(meta.n_features, N_FEATURES);
    assert_eq!(meta.metrics.test.mae, results.metrics.test.mae);
}

fn write_split_csv(dir: &Path, stem: &str, df: &mut polars::prelude::DataFrame) {
    let mut file = fs::File::create(dir.join(format!("{stem}.csv"))).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

#[test]
fn test_training_failure_leaves_existing_artifacts_untouched() {
    // A previous successful run has already populated the models dir.
    let models_dir = tempfile::tempdir().unwrap();
    let splits = synthetic_splits();
    let (model, results) = train_and_evaluate(&splits, test_params()).unwrap();
    let store = ArtifactStore::new(models_dir.path());
    store.write(&model, &results).unwrap();

    let model_before = fs::read(store.model_path()).unwrap();
    let features_before = fs::read(store.feature_list_path()).unwrap();
    let results_before = fs::read(store.results_path()).unwrap();

    // A retrain against a broken train split must fail before persistence.
    let data_dir = tempfile::tempdir().unwrap();
    let mut broken_train = synthetic_split(150, 0);
    let _ = broken_train.drop_in_place("lag_1h").unwrap();
    write_split_csv(data_dir.path(), "train_features", &mut broken_train);
    write_split_csv(data_dir.path(), "val_features", &mut synthetic_split(40, 150));
    write_split_csv(data_dir.path(), "test_features", &mut synthetic_split(40, 190));

    let result = demand_forecast::cli::cmd_train(data_dir.path(), models_dir.path(), test_params());
    assert!(result.is_err());

    assert_eq!(fs::read(store.model_path()).unwrap(), model_before);
    assert_eq!(fs::read(store.feature_list_path()).unwrap(), features_before);
    assert_eq!(fs::read(store.results_path()).unwrap(), results_before);
}

#[test]
fn test_read_from_empty_store_is_model_missing() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    match store.read() {
        Err(ForecastError::ModelMissing(path)) => {
            assert!(path.ends_with("model.bin"));
        }
        other => panic!("expected ModelMissing, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_feature_list_file_records_schema_order() {
    let splits = synthetic_splits();
    let (model, results) = train_and_evaluate(&splits, test_params()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    store.write(&model, &results).unwrap();

    let listed = std::fs::read_to_string(store.feature_list_path()).unwrap();
    let names: Vec<&str> = listed.lines().collect();
    assert_eq!(names, FEATURE_COLUMNS.to_vec());
}
