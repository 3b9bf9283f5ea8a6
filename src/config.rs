use serde::Deserialize;

/// Chunk size used when copying a raw resource into a provider pipe (8 KB).
pub const STREAM_CHUNK_BYTES: usize = 8 * 1024;

/// Number of chunks a provider pipe buffers before the writer has to wait.
pub const PIPE_CAPACITY_CHUNKS: usize = 8;

/// Byte budget of the HTTP transport cache (200 MB).
pub const HTTP_CACHE_MAX_BYTES: u64 = 200 * 1024 * 1024;

/// Sub-directory of the host cache dir holding transport cache entries.
pub const HTTP_CACHE_DIR_NAME: &str = "http";

/// Bitmap pool budget selected when the host does not pick one (32 MB).
pub const DEFAULT_BITMAP_POOL_BYTES: u64 = 32 << 20;

/// Bitmap pool sizes offered to the user, in menu order.
pub const BITMAP_POOL_PRESETS: [(&str, u64); 8] = [
    ("0 MB", 0),
    ("1 MB", 1 << 20),
    ("2 MB", 2 << 20),
    ("4 MB", 4 << 20),
    ("8 MB", 8 << 20),
    ("16 MB", 16 << 20),
    ("32 MB", 32 << 20),
    ("64 MB", 64 << 20),
];

/// Process-wide settings handed over by the host shell.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Host cache directory; the transport cache lives below it.
    pub cache_dir: String,
    /// Application package name, used to build the provider authority.
    pub package_name: String,
    /// Prefer the platform image decoder for bitmaps.
    pub use_image_decoder: bool,
    /// Let the image library keep active resources alive after release.
    pub active_resource_retention_allowed: bool,
    /// Bitmap pool budget in bytes; 0 disables pooling.
    pub bitmap_pool_bytes: u64,
    /// Byte budget of the HTTP transport cache.
    pub http_cache_max_bytes: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            cache_dir: String::new(),
            package_name: "com.example.glide".to_string(),
            use_image_decoder: false,
            active_resource_retention_allowed: false,
            bitmap_pool_bytes: DEFAULT_BITMAP_POOL_BYTES,
            http_cache_max_bytes: HTTP_CACHE_MAX_BYTES,
        }
    }
}

impl HostConfig {
    /// Authority under which the content provider is registered.
    pub fn provider_authority(&self) -> String {
        format!("{}.provider", self.package_name)
    }

    pub fn bitmap_pool(&self) -> BitmapPoolConfig {
        BitmapPoolConfig::from_bytes(self.bitmap_pool_bytes)
    }
}

/// Bitmap pool flavour derived from the configured byte budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapPoolConfig {
    /// No pooling; every bitmap is allocated fresh.
    Disabled,
    Lru { max_bytes: u64 },
}

impl BitmapPoolConfig {
    pub fn from_bytes(bytes: u64) -> Self {
        if bytes == 0 {
            Self::Disabled
        } else {
            Self::Lru { max_bytes: bytes }
        }
    }
}

/// Look up a bitmap pool preset by its menu label.
pub fn bitmap_pool_preset(label: &str) -> Option<u64> {
    BITMAP_POOL_PRESETS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, bytes)| *bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_pool_from_bytes() {
        assert_eq!(BitmapPoolConfig::from_bytes(0), BitmapPoolConfig::Disabled);
        assert_eq!(
            BitmapPoolConfig::from_bytes(4 << 20),
            BitmapPoolConfig::Lru { max_bytes: 4 << 20 }
        );
    }

    #[test]
    fn test_default_pool_is_a_preset() {
        assert_eq!(bitmap_pool_preset("32 MB"), Some(DEFAULT_BITMAP_POOL_BYTES));
        assert_eq!(bitmap_pool_preset("3 MB"), None);
    }

    #[test]
    fn test_provider_authority() {
        let config = HostConfig::default();
        assert_eq!(config.provider_authority(), "com.example.glide.provider");
    }
}
