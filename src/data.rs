//! Dataset split loading and feature matrix preparation

use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{ForecastError, Result};
use crate::schema::{FEATURE_COLUMNS, N_FEATURES, TARGET_COLUMN};

/// File stems of the three engineered-feature splits.
const SPLIT_STEMS: [&str; 3] = ["train_features", "val_features", "test_features"];

/// The three disjoint dataset splits produced by feature engineering.
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub train: DataFrame,
    pub val: DataFrame,
    pub test: DataFrame,
}

/// Load the train/validation/test splits from `dir`.
///
/// Each split is read from `<stem>.parquet` when present, falling back to
/// `<stem>.csv`.
pub fn load_splits(dir: &Path) -> Result<DatasetSplits> {
    let mut frames = Vec::with_capacity(3);
    for stem in SPLIT_STEMS {
        let df = load_split(dir, stem)?;
        info!(split = stem, rows = df.height(), cols = df.width(), "Loaded split");
        frames.push(df);
    }
    let test = frames.pop().unwrap();
    let val = frames.pop().unwrap();
    let train = frames.pop().unwrap();
    Ok(DatasetSplits { train, val, test })
}

fn load_split(dir: &Path, stem: &str) -> Result<DataFrame> {
    let parquet = dir.join(format!("{stem}.parquet"));
    if parquet.exists() {
        return read_parquet(&parquet);
    }
    let csv = dir.join(format!("{stem}.csv"));
    if csv.exists() {
        return read_csv(&csv);
    }
    Err(ForecastError::DataError(format!(
        "No {stem}.parquet or {stem}.csv in {}",
        dir.display()
    )))
}

fn read_parquet(path: &PathBuf) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| ForecastError::DataError(e.to_string()))?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| ForecastError::DataError(e.to_string()))
}

fn read_csv(path: &PathBuf) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| ForecastError::DataError(e.to_string()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| ForecastError::DataError(e.to_string()))
}

/// Extract the feature matrix and target vector from a split.
///
/// Columns are selected by name in [`FEATURE_COLUMNS`] order, which fixes
/// the positional meaning of every matrix column. Metadata columns such as
/// `pickup_hour` and `zone_id` are ignored.
pub fn feature_matrix(df: &DataFrame) -> Result<(Array2<f64>, Array1<f64>)> {
    let n_rows = df.height();
    let mut x = Array2::zeros((n_rows, N_FEATURES));

    for (j, name) in FEATURE_COLUMNS.iter().enumerate() {
        let values = numeric_column(df, name)?;
        for (i, v) in values.into_iter().enumerate() {
            x[[i, j]] = v;
        }
    }

    let y = Array1::from_vec(numeric_column(df, TARGET_COLUMN)?);
    Ok((x, y))
}

/// Read a column as f64, failing on missing columns or null entries.
fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df
        .column(name)
        .map_err(|_| ForecastError::DataError(format!("Missing column: {name}")))?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| ForecastError::DataError(format!("Column {name} is not numeric: {e}")))?;

    let ca = series
        .f64()
        .map_err(|e| ForecastError::DataError(e.to_string()))?;

    let mut out = Vec::with_capacity(ca.len());
    for (i, v) in ca.into_iter().enumerate() {
        match v {
            Some(v) => out.push(v),
            None => {
                return Err(ForecastError::DataError(format!(
                    "Null value in column {name} at row {i}"
                )))
            }
        }
    }
    Ok(out)
}
