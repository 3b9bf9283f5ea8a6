// Raw resource backends: where the provider's packaged files actually come from.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;
use tracing::debug;

use crate::error::ProviderError;

/// An opened raw resource ready to be copied.
pub struct OpenedResource {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub length: u64,
}

impl std::fmt::Debug for OpenedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedResource")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait RawResources: Send + Sync {
    /// Open the resource named `id`; unknown ids are `ProviderError::NotFound`.
    async fn open(&self, id: &str) -> Result<OpenedResource, ProviderError>;
}

/// Resources embedded in the binary or handed over by the host as byte buffers.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    entries: HashMap<String, Bytes>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(id, data);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, data: impl Into<Bytes>) {
        self.entries.insert(id.into(), data.into());
    }
}

#[async_trait]
impl RawResources for MemoryResources {
    async fn open(&self, id: &str) -> Result<OpenedResource, ProviderError> {
        let data = self
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        let length = data.len() as u64;
        Ok(OpenedResource {
            reader: Box::new(Cursor::new(data)),
            length,
        })
    }
}

/// Packaged raw files in a directory, looked up by file stem.
#[derive(Debug, Clone)]
pub struct DirResources {
    root: PathBuf,
}

impl DirResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn find(&self, id: &str) -> Result<Option<PathBuf>, ProviderError> {
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let stem_matches = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| stem == id);
            if stem_matches && entry.file_type().await?.is_file() {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

/// Raw resource names are restricted to `[a-z0-9_]+`.
fn is_valid_resource_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

#[async_trait]
impl RawResources for DirResources {
    async fn open(&self, id: &str) -> Result<OpenedResource, ProviderError> {
        if !is_valid_resource_id(id) {
            return Err(ProviderError::NotFound(id.to_string()));
        }

        let path = self
            .find(id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;

        let file = tokio::fs::File::open(&path).await?;
        let length = file.metadata().await?.len();
        debug!("opened raw resource {} at {} ({} bytes)", id, path.display(), length);

        Ok(OpenedResource {
            reader: Box::new(file),
            length,
        })
    }
}
