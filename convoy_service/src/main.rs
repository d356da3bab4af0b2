use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use convoy_service::{config::Config, context::AppContext, worker::spawn_workers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let ctx = Arc::new(AppContext::from_config(&config).await?);

    convoy_store::MIGRATOR.run(&ctx.pool).await?;

    let handles = spawn_workers(Arc::clone(&ctx));
    info!(workers = ctx.max_workers, "convoy optimization workers running");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    for handle in handles {
        handle.abort();
    }

    Ok(())
}
