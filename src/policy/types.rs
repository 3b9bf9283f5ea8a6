use serde::Deserialize;

/// Tier or origin a fetched payload was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum DataSource {
    /// Local storage, content providers, packaged resources.
    Local,
    /// Network.
    Remote,
    /// Raw data previously written to the disk cache.
    DataDiskCache,
    /// Transformed resource previously written to the disk cache.
    ResourceDiskCache,
    MemoryCache,
}

impl DataSource {
    pub const ALL: [DataSource; 5] = [
        DataSource::Local,
        DataSource::Remote,
        DataSource::DataDiskCache,
        DataSource::ResourceDiskCache,
        DataSource::MemoryCache,
    ];

    /// Whether the payload came from a fetch rather than one of the cache tiers.
    pub fn is_first_generation(self) -> bool {
        matches!(self, DataSource::Local | DataSource::Remote)
    }
}

/// How the resource about to be cached was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum EncodeStrategy {
    /// The source bytes are written back unchanged.
    Source,
    /// The resource was decoded and re-encoded after transformation.
    Transformed,
    None,
}

impl EncodeStrategy {
    pub const ALL: [EncodeStrategy; 3] = [
        EncodeStrategy::Source,
        EncodeStrategy::Transformed,
        EncodeStrategy::None,
    ];
}

/// Admission outcome for one completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheDecision {
    pub cache_raw_data: bool,
    pub cache_transformed_resource: bool,
}

impl CacheDecision {
    pub fn writes_anything(&self) -> bool {
        self.cache_raw_data || self.cache_transformed_resource
    }
}
