//! Shared fixtures: synthetic dataset splits with the production schema

use polars::prelude::*;

use demand_forecast::model::GradientBoostingConfig;
use demand_forecast::data::DatasetSplits;
use demand_forecast::schema::{FEATURE_COLUMNS, METADATA_COLUMNS, TARGET_COLUMN};

/// Build one synthetic split with all 17 feature columns, the target and
/// the metadata columns. The target is a deterministic function of the lag
/// features so a small model can fit it.
pub fn synthetic_split(n: usize, offset: usize) -> DataFrame {
    let mut cols: Vec<Column> = Vec::new();

    for (j, name) in FEATURE_COLUMNS.iter().enumerate() {
        let vals: Vec<f64> = (0..n)
            .map(|i| {
                let t = (i + offset) as f64;
                match *name {
                    "lag_1h" => 20.0 + (t * 0.7).sin() * 15.0,
                    "lag_24h" => 20.0 + (t * 0.3).cos() * 10.0,
                    "lag_168h" => 18.0 + (t * 0.1).sin() * 8.0,
                    "zone_is_top50" => (i % 2) as f64,
                    _ => ((t + j as f64) * 0.13).sin(),
                }
            })
            .collect();
        if *name == "zone_is_top50" {
            let flags: Vec<i64> = vals.iter().map(|v| *v as i64).collect();
            cols.push(Column::new((*name).into(), flags));
        } else {
            cols.push(Column::new((*name).into(), vals));
        }
    }

    let target: Vec<f64> = (0..n)
        .map(|i| {
            let t = (i + offset) as f64;
            let lag_1h = 20.0 + (t * 0.7).sin() * 15.0;
            let lag_24h = 20.0 + (t * 0.3).cos() * 10.0;
            (0.6 * lag_1h + 0.4 * lag_24h).max(0.0)
        })
        .collect();
    cols.push(Column::new(TARGET_COLUMN.into(), target));

    let hours: Vec<i64> = (0..n as i64).collect();
    let zones: Vec<i64> = (0..n).map(|i| (i % 50) as i64).collect();
    cols.push(Column::new(METADATA_COLUMNS[0].into(), hours));
    cols.push(Column::new(METADATA_COLUMNS[1].into(), zones));

    DataFrame::new(cols).unwrap()
}

pub fn synthetic_splits() -> DatasetSplits {
    DatasetSplits {
        train: synthetic_split(150, 0),
        val: synthetic_split(40, 150),
        test: synthetic_split(40, 190),
    }
}

/// Hyperparameters small enough for fast test runs.
pub fn test_params() -> GradientBoostingConfig {
    GradientBoostingConfig {
        n_estimators: 20,
        max_depth: 3,
        ..Default::default()
    }
}
