//! Feature schema: the single source of truth for feature names and order.
//!
//! The model consumes a positional feature matrix, so the column order used
//! at training time must be the exact order used when a request is turned
//! into a row at serving time. Both sides derive from this module: the
//! trainer selects columns by [`FEATURE_COLUMNS`], and [`FeatureVector::to_row`]
//! lists its fields in the same order.

use serde::{Deserialize, Serialize};

/// Ordered feature columns produced by the upstream feature-engineering step.
pub const FEATURE_COLUMNS: [&str; 17] = [
    // Temporal features (cyclical encoding)
    "hour_sin",
    "hour_cos",
    "dow_sin",
    "dow_cos",
    "month_sin",
    "month_cos",
    // Lag features
    "lag_1h",
    "lag_24h",
    "lag_168h",
    "diff_24h",
    // Rolling statistics
    "rolling_7d_mean",
    "rolling_7d_std",
    "rolling_14d_mean",
    "rolling_7d_cv",
    // Zone features
    "zone_mean_demand",
    "zone_rank",
    "zone_is_top50",
];

/// Number of model inputs.
pub const N_FEATURES: usize = FEATURE_COLUMNS.len();

/// Observed hourly pickup count, the regression target.
pub const TARGET_COLUMN: &str = "pickups";

/// Columns present in the dataset splits but excluded from model input.
pub const METADATA_COLUMNS: [&str; 2] = ["pickup_hour", "zone_id"];

/// One fully-specified feature row, as received by the prediction endpoint.
///
/// Field order matches [`FEATURE_COLUMNS`]. All fields are required;
/// deserialization fails before any inference happens if one is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub hour_sin: f64,
    pub hour_cos: f64,
    pub dow_sin: f64,
    pub dow_cos: f64,
    pub month_sin: f64,
    pub month_cos: f64,
    pub lag_1h: f64,
    pub lag_24h: f64,
    pub lag_168h: f64,
    pub diff_24h: f64,
    pub rolling_7d_mean: f64,
    pub rolling_7d_std: f64,
    pub rolling_14d_mean: f64,
    pub rolling_7d_cv: f64,
    pub zone_mean_demand: f64,
    pub zone_rank: f64,
    /// 1 if the zone is among the 50 busiest, else 0.
    pub zone_is_top50: i64,
}

impl FeatureVector {
    /// Build the positional input row in [`FEATURE_COLUMNS`] order.
    pub fn to_row(&self) -> [f64; N_FEATURES] {
        [
            self.hour_sin,
            self.hour_cos,
            self.dow_sin,
            self.dow_cos,
            self.month_sin,
            self.month_cos,
            self.lag_1h,
            self.lag_24h,
            self.lag_168h,
            self.diff_24h,
            self.rolling_7d_mean,
            self.rolling_7d_std,
            self.rolling_14d_mean,
            self.rolling_7d_cv,
            self.zone_mean_demand,
            self.zone_rank,
            self.zone_is_top50 as f64,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distinct_vector() -> FeatureVector {
        FeatureVector {
            hour_sin: 1.0,
            hour_cos: 2.0,
            dow_sin: 3.0,
            dow_cos: 4.0,
            month_sin: 5.0,
            month_cos: 6.0,
            lag_1h: 7.0,
            lag_24h: 8.0,
            lag_168h: 9.0,
            diff_24h: 10.0,
            rolling_7d_mean: 11.0,
            rolling_7d_std: 12.0,
            rolling_14d_mean: 13.0,
            rolling_7d_cv: 14.0,
            zone_mean_demand: 15.0,
            zone_rank: 16.0,
            zone_is_top50: 17,
        }
    }

    #[test]
    fn test_row_order_matches_feature_columns() {
        // Every position in to_row() must hold the value of the field named
        // at the same position in FEATURE_COLUMNS. Distinct values per field
        // make any ordering mistake visible.
        let fv = distinct_vector();
        let row = fv.to_row();
        let json = serde_json::to_value(&fv).unwrap();

        for (i, name) in FEATURE_COLUMNS.iter().enumerate() {
            let by_name = json[name].as_f64().unwrap();
            assert_eq!(
                row[i], by_name,
                "row position {} does not match field '{}'",
                i, name
            );
        }
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut json = serde_json::to_value(distinct_vector()).unwrap();
        json.as_object_mut().unwrap().remove("lag_24h");
        let result: Result<FeatureVector, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_integer_flag_rejects_float() {
        let mut json = serde_json::to_value(distinct_vector()).unwrap();
        json["zone_is_top50"] = serde_json::json!(0.5);
        let result: Result<FeatureVector, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }
}
