use super::strategy::DiskCacheStrategy;

/// Per-request cache toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub disk_cache_strategy: DiskCacheStrategy,
    pub skip_memory_cache: bool,
    pub skip_disk_cache: bool,
}

impl RequestOptions {
    pub fn new(disk_cache_strategy: DiskCacheStrategy) -> Self {
        Self {
            disk_cache_strategy,
            ..Self::default()
        }
    }

    pub fn skip_memory_cache(mut self, skip: bool) -> Self {
        self.skip_memory_cache = skip;
        self
    }

    pub fn skip_disk_cache(mut self, skip: bool) -> Self {
        self.skip_disk_cache = skip;
        self
    }

    /// Strategy actually applied; skipping the disk cache overrides the configured one.
    pub fn effective_strategy(&self) -> DiskCacheStrategy {
        if self.skip_disk_cache {
            DiskCacheStrategy::None
        } else {
            self.disk_cache_strategy
        }
    }

    pub fn use_memory_cache(&self) -> bool {
        !self.skip_memory_cache
    }
}
