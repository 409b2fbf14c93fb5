use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use product_analytics::server::AppServer;
use product_analytics::{acquire, AppConfig, AppContext};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env()?;
    info!(
        "starting: dataset={} listen={}",
        config.data_path.display(),
        config.socket_addr()
    );

    // One-shot bootstrap: any failure here aborts startup and the container
    // restart re-evaluates the existence check.
    acquire::ensure_dataset(&config.dataset_url, &config.data_path).await?;

    let bind_addr = config.socket_addr();
    let ctx = Arc::new(AppContext::new(config));

    // Construct the shared handle now so a missing or corrupt dataset fails
    // startup instead of the first request.
    let engine = ctx.engine_handle()?;
    info!("dataset loaded: {} rows", engine.row_count()?);

    let server = AppServer::start(ctx, bind_addr).await?;
    info!("listening on http://{}", server.addr());

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    server.shutdown();

    Ok(())
}
