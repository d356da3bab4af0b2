use std::env;

use anyhow::{Context, bail};
use convoy_providers::provider::ProviderKind;

pub const DEFAULT_MAX_WORKERS: usize = 4;
pub const DEFAULT_QUEUE_NAME: &str = "optimization_requests";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QueueBackend {
    Memory,
    Redis,
}

/// Process-wide configuration, read once at startup. Missing required keys
/// abort the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub routing_provider: ProviderKind,
    pub geoapify_api_key: Option<String>,
    pub graphhopper_api_key: Option<String>,
    pub tomtom_api_key: Option<String>,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub queue_name: String,
    pub max_workers: usize,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let routing_provider: ProviderKind = env::var("ROUTING_PROVIDER")
            .context("ROUTING_PROVIDER is not set")?
            .parse()
            .map_err(anyhow::Error::msg)?;

        let max_workers = match optional("OPTIMIZATION_MAX_WORKERS") {
            Some(value) => value
                .parse()
                .context("OPTIMIZATION_MAX_WORKERS is not a number")?,
            None => DEFAULT_MAX_WORKERS,
        };

        let config = Config {
            routing_provider,
            geoapify_api_key: optional("GEOAPIFY_API_KEY"),
            graphhopper_api_key: optional("GRAPHHOPPER_API_KEY"),
            tomtom_api_key: optional("TOM_TOM_API_KEY"),
            database_url,
            redis_url: optional("REDIS_URL"),
            queue_name: optional("OPTIMIZATION_QUEUE_NAME")
                .unwrap_or_else(|| DEFAULT_QUEUE_NAME.to_string()),
            max_workers,
        };

        if config.active_api_key().is_none() {
            bail!(
                "no API key configured for routing provider {}",
                config.routing_provider
            );
        }

        Ok(config)
    }

    pub fn active_api_key(&self) -> Option<&str> {
        match self.routing_provider {
            ProviderKind::Geoapify => self.geoapify_api_key.as_deref(),
            ProviderKind::GraphHopper => self.graphhopper_api_key.as_deref(),
            ProviderKind::TomTom => self.tomtom_api_key.as_deref(),
        }
    }

    pub fn queue_backend(&self) -> QueueBackend {
        if self.redis_url.is_some() {
            QueueBackend::Redis
        } else {
            QueueBackend::Memory
        }
    }
}
