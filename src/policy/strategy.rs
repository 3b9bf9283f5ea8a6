// Disk cache strategies: admission and decode rules per strategy variant.

use serde::Deserialize;
use tracing::debug;

use super::types::{CacheDecision, DataSource, EncodeStrategy};

/// Disk cache strategy applied to a request.
///
/// Every hook is a pure function of its arguments; a strategy value carries no
/// state and can be shared freely between concurrent fetch completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum DiskCacheStrategy {
    /// Never write or read the disk cache.
    None,
    /// Cache the raw fetched data only.
    Data,
    /// Cache the final transformed resource only.
    Resource,
    /// Cache remote raw data and every non-cached transformed resource.
    All,
    /// Cache remote raw data; cache transformed resources from local loads and
    /// from disk-cache hits reached through an alternate key.
    Automatic,
    /// Leave raw bytes to the HTTP transport cache and only persist transformed
    /// resources produced by a real fetch.
    #[default]
    TransportBacked,
}

impl DiskCacheStrategy {
    /// Whether the raw fetched bytes should be written to the data cache.
    pub fn should_cache_raw_data(self, data_source: DataSource) -> bool {
        debug!("should_cache_raw_data strategy={:?} source={:?}", self, data_source);

        match self {
            DiskCacheStrategy::None
            | DiskCacheStrategy::Resource
            | DiskCacheStrategy::TransportBacked => false,
            DiskCacheStrategy::Data => !matches!(
                data_source,
                DataSource::DataDiskCache | DataSource::MemoryCache
            ),
            DiskCacheStrategy::All | DiskCacheStrategy::Automatic => {
                data_source == DataSource::Remote
            }
        }
    }

    /// Whether the transformed resource should be written to the resource cache.
    pub fn should_cache_transformed_resource(
        self,
        is_from_alternate_key: bool,
        data_source: DataSource,
        encode_strategy: EncodeStrategy,
    ) -> bool {
        debug!(
            "should_cache_transformed_resource strategy={:?} alternate_key={} source={:?} encode={:?}",
            self, is_from_alternate_key, data_source, encode_strategy
        );

        match self {
            DiskCacheStrategy::None | DiskCacheStrategy::Data => false,
            DiskCacheStrategy::Resource | DiskCacheStrategy::All => !matches!(
                data_source,
                DataSource::ResourceDiskCache | DataSource::MemoryCache
            ),
            DiskCacheStrategy::Automatic => {
                let eligible_source = (is_from_alternate_key
                    && data_source == DataSource::DataDiskCache)
                    || data_source == DataSource::Local;
                eligible_source && encode_strategy == EncodeStrategy::Transformed
            }
            DiskCacheStrategy::TransportBacked => match encode_strategy {
                EncodeStrategy::Source | EncodeStrategy::None => false,
                // The alternate-key flag does not widen eligibility here.
                EncodeStrategy::Transformed => data_source.is_first_generation(),
            },
        }
    }

    /// Whether a cached transformed resource may be decoded instead of refetching.
    pub fn should_decode_cached_transformed_resource(self) -> bool {
        debug!("should_decode_cached_transformed_resource strategy={:?}", self);

        match self {
            DiskCacheStrategy::None | DiskCacheStrategy::Data => false,
            DiskCacheStrategy::Resource
            | DiskCacheStrategy::All
            | DiskCacheStrategy::Automatic
            | DiskCacheStrategy::TransportBacked => true,
        }
    }

    /// Whether cached raw data may be decoded instead of refetching.
    pub fn should_decode_cached_raw_data(self) -> bool {
        debug!("should_decode_cached_raw_data strategy={:?}", self);

        match self {
            DiskCacheStrategy::None
            | DiskCacheStrategy::Resource
            | DiskCacheStrategy::TransportBacked => false,
            DiskCacheStrategy::Data | DiskCacheStrategy::All | DiskCacheStrategy::Automatic => {
                true
            }
        }
    }

    /// Evaluate both admission hooks for one fetch.
    pub fn decide(
        self,
        is_from_alternate_key: bool,
        data_source: DataSource,
        encode_strategy: EncodeStrategy,
    ) -> CacheDecision {
        CacheDecision {
            cache_raw_data: self.should_cache_raw_data(data_source),
            cache_transformed_resource: self.should_cache_transformed_resource(
                is_from_alternate_key,
                data_source,
                encode_strategy,
            ),
        }
    }
}
