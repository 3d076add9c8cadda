use anyhow::Context;

use coffeeclub_infra::config::IndexerConfig;
use coffeeclub_infra::indexer::Indexer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    coffeeclub_observability::init();

    let config = IndexerConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        network = ?config.network,
        rpc_url = %config.rpc_url,
        "configuration loaded"
    );

    let indexer = Indexer::start(&config)
        .await
        .context("failed to start indexer")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("shutdown requested");

    indexer.shutdown().await;
    Ok(())
}
