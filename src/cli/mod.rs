//! Command-line interface
//!
//! Two subcommands: `train` runs the whole pipeline end to end (load splits,
//! train, evaluate, persist), `serve` starts the prediction API.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::artifact::ArtifactStore;
use crate::data::load_splits;
use crate::model::GradientBoostingConfig;
use crate::server::{run_server, ServerConfig};
use crate::training::train_and_evaluate;

#[derive(Parser)]
#[command(name = "demand-forecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "NYC taxi demand forecasting: training pipeline and prediction API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the demand model on engineered features and persist artifacts
    Train {
        /// Directory containing train/val/test feature splits
        #[arg(short, long, default_value = "data/processed")]
        data_dir: PathBuf,

        /// Directory to write model artifacts into
        #[arg(short, long, default_value = "models")]
        models_dir: PathBuf,

        /// Number of boosting rounds
        #[arg(long, default_value = "500")]
        n_estimators: usize,

        /// Maximum tree depth
        #[arg(long, default_value = "6")]
        max_depth: usize,

        /// Learning rate
        #[arg(long, default_value = "0.1")]
        learning_rate: f64,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Serve predictions over HTTP
    Serve {
        /// Host to bind (default: $API_HOST, else 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (default: $API_PORT, else 8000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory containing model artifacts (default: $MODELS_DIR, else ./models)
        #[arg(short, long)]
        models_dir: Option<PathBuf>,
    },
}

/// Run the training pipeline end to end. No partial or resume mode: any
/// failure aborts before artifacts are written.
pub fn cmd_train(
    data_dir: &Path,
    models_dir: &Path,
    params: GradientBoostingConfig,
) -> anyhow::Result<()> {
    let start = Instant::now();
    info!(data_dir = %data_dir.display(), "Loading dataset splits");
    let splits = load_splits(data_dir)?;

    if params.n_jobs > 0 {
        // Cap rayon's pool; non-positive keeps the all-cores default
        rayon::ThreadPoolBuilder::new()
            .num_threads(params.n_jobs as usize)
            .build_global()
            .ok();
    }

    let (model, results) = train_and_evaluate(&splits, params)?;

    let store = ArtifactStore::new(models_dir);
    store.write(&model, &results)?;

    println!();
    println!("  {}", "Training complete".white().bold());
    for (name, m) in [
        ("train", &results.metrics.train),
        ("val", &results.metrics.val),
        ("test", &results.metrics.test),
    ] {
        println!(
            "  {:6} MAE={:.4}  RMSE={:.4}  R²={:.4}",
            name, m.mae, m.rmse, m.r2
        );
    }
    println!(
        "  {} {}",
        "artifacts:".truecolor(140, 140, 140),
        models_dir.display()
    );
    println!(
        "  {} {:.1}s",
        "elapsed:".truecolor(140, 140, 140),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Resolve the server configuration: explicit flags win, anything left
/// unset falls back to the env-var-aware defaults.
pub fn serve_config(
    host: Option<String>,
    port: Option<u16>,
    models_dir: Option<PathBuf>,
) -> ServerConfig {
    let defaults = ServerConfig::default();
    ServerConfig {
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
        models_dir: models_dir
            .map(|d| d.display().to_string())
            .unwrap_or(defaults.models_dir),
    }
}

/// Start the prediction server.
pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    models_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    run_server(serve_config(host, port, models_dir)).await
}
