// Load orchestration: picks a source for a model and applies the disk cache strategy to the result.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::policy::request::RequestOptions;
use crate::policy::strategy::DiskCacheStrategy;
use crate::policy::types::{CacheDecision, EncodeStrategy};
use crate::source::traits::{FetchedImage, ImageSource};

/// A completed fetch together with the strategy that governs caching it.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub image: FetchedImage,
    pub strategy: DiskCacheStrategy,
    /// Whether the model was resolved through an alternate cache key.
    pub is_from_alternate_key: bool,
}

impl LoadOutcome {
    /// Admission decision once the resource has been encoded with `encode_strategy`.
    pub fn decision(&self, encode_strategy: EncodeStrategy) -> CacheDecision {
        self.strategy.decide(
            self.is_from_alternate_key,
            self.image.data_source,
            encode_strategy,
        )
    }

    pub fn should_cache_raw_data(&self) -> bool {
        self.strategy.should_cache_raw_data(self.image.data_source)
    }
}

#[derive(Default)]
pub struct ImageLoader {
    sources: Vec<Arc<dyn ImageSource>>,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source; earlier sources win when several handle a model.
    pub fn with_source(mut self, source: Arc<dyn ImageSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub async fn load(&self, model: &str, options: &RequestOptions) -> Result<LoadOutcome> {
        let t0 = Instant::now();
        let source = self
            .sources
            .iter()
            .find(|s| s.handles(model))
            .ok_or_else(|| anyhow!("no source handles model {}", model))?;

        let image = source.fetch(model).await?;
        let strategy = options.effective_strategy();

        debug!(
            "load model={} source={:?} bytes={} strategy={:?} elapsed_ms={}",
            model,
            image.data_source,
            image.bytes.len(),
            strategy,
            t0.elapsed().as_millis()
        );

        Ok(LoadOutcome {
            image,
            strategy,
            is_from_alternate_key: false,
        })
    }
}
