// On-disk HTTP transport cache: responses keyed by URL hash, bounded by a byte budget.
//
// Entry file layout: the content type, a newline, then the raw body. Entries
// are written to a temp file and renamed into place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

const TEMP_SUFFIX: &str = ".tmp";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A cached response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub content_type: String,
    pub body: Bytes,
}

impl CachedResponse {
    fn encode(content_type: &str, body: &[u8]) -> Vec<u8> {
        let content_type = if content_type.is_empty() || content_type.contains(['\r', '\n']) {
            FALLBACK_CONTENT_TYPE
        } else {
            content_type
        };
        let mut out = Vec::with_capacity(content_type.len() + 1 + body.len());
        out.extend_from_slice(content_type.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(body);
        out
    }

    fn decode(data: Vec<u8>) -> Option<Self> {
        let split = data.iter().position(|&b| b == b'\n')?;
        let content_type = std::str::from_utf8(&data[..split]).ok()?.to_string();
        let body = Bytes::from(data).slice(split + 1..);
        Some(Self { content_type, body })
    }
}

/// Entry files are named by the hex sha256 of their URL.
fn is_entry_name(name: &str) -> bool {
    name.len() == 64 && name.bytes().all(|b| b.is_ascii_hexdigit())
}

struct Entry {
    size: u64,
    last_access: u64,
}

#[derive(Default)]
struct Index {
    entries: HashMap<String, Entry>,
    total_bytes: u64,
    tick: u64,
}

impl Index {
    fn touch(&mut self, key: &str) {
        self.tick += 1;
        let tick = self.tick;
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_access = tick;
        }
    }

    fn insert(&mut self, key: String, size: u64) {
        self.tick += 1;
        let entry = Entry {
            size,
            last_access: self.tick,
        };
        if let Some(old) = self.entries.insert(key, entry) {
            self.total_bytes -= old.size;
        }
        self.total_bytes += size;
    }

    fn remove(&mut self, key: &str) -> Option<u64> {
        let entry = self.entries.remove(key)?;
        self.total_bytes -= entry.size;
        Some(entry.size)
    }

    /// Keys to drop, least recently used first, until the total fits `max_bytes`.
    fn eviction_victims(&self, max_bytes: u64) -> Vec<String> {
        if self.total_bytes <= max_bytes {
            return Vec::new();
        }
        let mut by_age: Vec<(&String, &Entry)> = self.entries.iter().collect();
        by_age.sort_by_key(|(_, e)| e.last_access);

        let mut excess = self.total_bytes - max_bytes;
        let mut victims = Vec::new();
        for (key, entry) in by_age {
            if excess == 0 {
                break;
            }
            victims.push(key.clone());
            excess = excess.saturating_sub(entry.size);
        }
        victims
    }
}

pub struct HttpCache {
    dir: PathBuf,
    max_bytes: u64,
    index: Mutex<Index>,
}

impl HttpCache {
    /// Open (or create) a cache in `dir`, indexing entries already on disk.
    pub fn open(dir: &Path, max_bytes: u64) -> Result<Self> {
        if max_bytes == 0 {
            return Err(anyhow!("max_bytes must be > 0"));
        }
        std::fs::create_dir_all(dir)?;

        let mut index = Index::default();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.ends_with(TEMP_SUFFIX) {
                // Left over from an interrupted write.
                if let Err(e) = std::fs::remove_file(entry.path()) {
                    warn!("http cache could not remove {}: {}", name, e);
                }
                continue;
            }
            if is_entry_name(&name) {
                index.insert(name, meta.len());
            }
        }
        info!(
            "http cache opened at {}: {} entries, {} bytes",
            dir.display(),
            index.entries.len(),
            index.total_bytes
        );

        let cache = Self {
            dir: dir.to_path_buf(),
            max_bytes,
            index: Mutex::new(index),
        };
        cache.evict_to_budget();
        Ok(cache)
    }

    pub fn key_for(url: &str) -> String {
        hex::encode(Sha256::digest(url.as_bytes()))
    }

    /// Cached response for `url`, if present.
    pub async fn get(&self, url: &str) -> Result<Option<CachedResponse>> {
        let key = Self::key_for(url);
        if !self.index.lock().entries.contains_key(&key) {
            return Ok(None);
        }

        let data = match tokio::fs::read(self.dir.join(&key)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Removed behind our back.
                self.index.lock().remove(&key);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match CachedResponse::decode(data) {
            Some(cached) => {
                self.index.lock().touch(&key);
                debug!(
                    "http cache hit {} ({} bytes, {})",
                    url,
                    cached.body.len(),
                    cached.content_type
                );
                Ok(Some(cached))
            }
            None => {
                warn!("http cache entry for {} is malformed, dropping it", url);
                self.index.lock().remove(&key);
                if let Err(e) = tokio::fs::remove_file(self.dir.join(&key)).await {
                    debug!("http cache remove {} failed: {}", key, e);
                }
                Ok(None)
            }
        }
    }

    /// Store a response for `url`. Entries larger than the whole budget are skipped.
    pub async fn put(&self, url: &str, content_type: &str, body: &[u8]) -> Result<()> {
        let data = CachedResponse::encode(content_type, body);
        let size = data.len() as u64;
        if size > self.max_bytes {
            debug!("http cache skip {}: {} bytes exceeds budget", url, size);
            return Ok(());
        }

        let key = Self::key_for(url);
        let final_path = self.dir.join(&key);
        let temp_path = self
            .dir
            .join(format!("{}.{}{}", key, uuid::Uuid::new_v4(), TEMP_SUFFIX));

        if let Err(e) = tokio::fs::write(&temp_path, &data).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        self.index.lock().insert(key, size);
        debug!("http cache stored {} ({} bytes)", url, size);

        self.evict_to_budget();
        Ok(())
    }

    fn evict_to_budget(&self) {
        let mut index = self.index.lock();
        for key in index.eviction_victims(self.max_bytes) {
            if let Err(e) = std::fs::remove_file(self.dir.join(&key)) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("http cache evict {} failed: {}", key, e);
                    continue;
                }
            }
            index.remove(&key);
        }
    }

    /// Drop every cached response.
    pub fn evict_all(&self) -> Result<()> {
        let mut index = self.index.lock();
        let keys: Vec<String> = index.entries.keys().cloned().collect();
        for key in keys {
            match std::fs::remove_file(self.dir.join(&key)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            index.remove(&key);
        }
        info!("http cache cleared");
        Ok(())
    }

    pub fn size_bytes(&self) -> u64 {
        self.index.lock().total_bytes
    }

    pub fn entry_count(&self) -> usize {
        self.index.lock().entries.len()
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}
