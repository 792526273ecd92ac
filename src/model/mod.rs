//! Regression models

mod decision_tree;
mod gradient_boosting;

pub use decision_tree::RegressionTree;
pub use gradient_boosting::{GradientBoostedRegressor, GradientBoostingConfig};
