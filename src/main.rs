//! Demand forecast - main entry point

use clap::Parser;
use demand_forecast::cli::{cmd_serve, cmd_train, Cli, Commands};
use demand_forecast::model::GradientBoostingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demand_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data_dir,
            models_dir,
            n_estimators,
            max_depth,
            learning_rate,
            seed,
        } => {
            let params = GradientBoostingConfig {
                n_estimators,
                max_depth,
                learning_rate,
                random_state: Some(seed),
                ..Default::default()
            };
            cmd_train(&data_dir, &models_dir, params)?;
        }
        Commands::Serve {
            host,
            port,
            models_dir,
        } => {
            cmd_serve(host, port, models_dir).await?;
        }
    }

    Ok(())
}
