use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use convoy_providers::provider::RoutingProvider;
use convoy_store::{loader::DataLoader, persister::RoutePersister, requests::RequestStore};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::{
    config::Config,
    queue::{RedisQueue, WorkQueue},
};

/// Everything a worker or submitter needs, constructed once at startup and
/// passed explicitly. There is no module-level state anywhere in the core.
pub struct AppContext {
    pub pool: PgPool,
    pub provider: Arc<RoutingProvider>,
    pub queue: Arc<WorkQueue>,
    pub requests: RequestStore,
    pub loader: DataLoader,
    pub persister: RoutePersister,
    pub max_workers: usize,
}

impl AppContext {
    pub async fn from_config(config: &Config) -> anyhow::Result<AppContext> {
        let pool = PgPoolOptions::new()
            .max_connections(30)
            .acquire_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(3600))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        let api_key = config
            .active_api_key()
            .with_context(|| format!("no API key for routing provider {}", config.routing_provider))?
            .to_string();
        let provider = RoutingProvider::from_kind(config.routing_provider, api_key);

        let queue = match &config.redis_url {
            None => WorkQueue::in_memory(),
            Some(url) => {
                WorkQueue::Redis(RedisQueue::connect(url, config.queue_name.clone()).await?)
            }
        };

        info!(
            provider = %config.routing_provider,
            workers = config.max_workers,
            "application context ready"
        );

        Ok(AppContext {
            requests: RequestStore::new(pool.clone()),
            loader: DataLoader::new(pool.clone()),
            persister: RoutePersister::new(pool.clone()),
            pool,
            provider: Arc::new(provider),
            queue: Arc::new(queue),
            max_workers: config.max_workers,
        })
    }
}
