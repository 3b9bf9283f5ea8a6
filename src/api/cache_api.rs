use crate::config::BITMAP_POOL_PRESETS;
use crate::policy::strategy::DiskCacheStrategy;
use crate::policy::types::{CacheDecision, DataSource, EncodeStrategy};

/// Admission decision the host's image library should apply for one fetch.
#[derive(Debug, Clone)]
pub struct DiskCacheDecision {
    pub cache_raw_data: bool,
    pub cache_transformed_resource: bool,
    pub decode_cached_raw_data: bool,
    pub decode_cached_transformed_resource: bool,
}

#[flutter_rust_bridge::frb(sync)]
pub fn disk_cache_decision(
    strategy: DiskCacheStrategy,
    is_from_alternate_key: bool,
    data_source: DataSource,
    encode_strategy: EncodeStrategy,
) -> DiskCacheDecision {
    let CacheDecision {
        cache_raw_data,
        cache_transformed_resource,
    } = strategy.decide(is_from_alternate_key, data_source, encode_strategy);

    DiskCacheDecision {
        cache_raw_data,
        cache_transformed_resource,
        decode_cached_raw_data: strategy.should_decode_cached_raw_data(),
        decode_cached_transformed_resource: strategy.should_decode_cached_transformed_resource(),
    }
}

/// Bitmap pool menu entries as (label, bytes).
#[flutter_rust_bridge::frb(sync)]
pub fn bitmap_pool_presets() -> Vec<(String, u64)> {
    BITMAP_POOL_PRESETS
        .iter()
        .map(|(label, bytes)| (label.to_string(), *bytes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy_decision() {
        let d = disk_cache_decision(
            DiskCacheStrategy::default(),
            false,
            DataSource::Remote,
            EncodeStrategy::Transformed,
        );
        assert!(!d.cache_raw_data);
        assert!(d.cache_transformed_resource);
        assert!(!d.decode_cached_raw_data);
        assert!(d.decode_cached_transformed_resource);
    }

    #[test]
    fn test_presets_in_menu_order() {
        let presets = bitmap_pool_presets();
        assert_eq!(presets.len(), 8);
        assert_eq!(presets[0], ("0 MB".to_string(), 0));
        assert_eq!(presets[7], ("64 MB".to_string(), 64 << 20));
    }
}
