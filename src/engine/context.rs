// Host context: process-wide shared resources passed explicitly to components.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use reqwest::Client;
use tracing::info;

use super::http_cache::HttpCache;
use crate::config::{BitmapPoolConfig, HostConfig, HTTP_CACHE_DIR_NAME};

pub struct AppContext {
    config: HostConfig,
    http_client: Client,
    http_cache: Arc<HttpCache>,
}

impl AppContext {
    pub fn new(config: HostConfig) -> Result<Self> {
        if config.cache_dir.trim().is_empty() {
            return Err(anyhow!("cache_dir must not be empty"));
        }

        let http_cache = Arc::new(HttpCache::open(
            &Path::new(&config.cache_dir).join(HTTP_CACHE_DIR_NAME),
            config.http_cache_max_bytes,
        )?);

        let http_client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(
            "app context ready: cache_dir={} image_decoder={} retention={} bitmap_pool={:?}",
            config.cache_dir,
            config.use_image_decoder,
            config.active_resource_retention_allowed,
            config.bitmap_pool()
        );

        Ok(Self {
            config,
            http_client,
            http_cache,
        })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Shared HTTP client; clones share one connection pool.
    pub fn http_client(&self) -> Client {
        self.http_client.clone()
    }

    pub fn http_cache(&self) -> Arc<HttpCache> {
        Arc::clone(&self.http_cache)
    }

    pub fn use_image_decoder(&self) -> bool {
        self.config.use_image_decoder
    }

    pub fn active_resource_retention_allowed(&self) -> bool {
        self.config.active_resource_retention_allowed
    }

    pub fn bitmap_pool(&self) -> BitmapPoolConfig {
        self.config.bitmap_pool()
    }

    pub fn provider_authority(&self) -> String {
        self.config.provider_authority()
    }

    /// Evict every entry of the HTTP transport cache.
    pub fn clear_http_cache(&self) -> Result<()> {
        self.http_cache.evict_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_requires_cache_dir() {
        assert!(AppContext::new(HostConfig::default()).is_err());
    }

    #[test]
    fn test_context_exposes_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig {
            cache_dir: dir.path().to_str().unwrap().to_string(),
            use_image_decoder: true,
            bitmap_pool_bytes: 0,
            ..HostConfig::default()
        };
        let ctx = AppContext::new(config).unwrap();
        assert!(ctx.use_image_decoder());
        assert!(!ctx.active_resource_retention_allowed());
        assert_eq!(ctx.bitmap_pool(), BitmapPoolConfig::Disabled);
        assert!(dir.path().join(HTTP_CACHE_DIR_NAME).is_dir());
        assert_eq!(ctx.http_cache().size_bytes(), 0);
    }
}
