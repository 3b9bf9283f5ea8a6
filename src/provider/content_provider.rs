// Content provider: serves packaged image files through pipes or direct descriptors.

use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::pipe::{create_pipe, ReadableHandle};
use super::resources::RawResources;
use super::transfer::{spawn_transfer, StreamRequest};
use super::uri::{ProviderFile, UriMatcher};
use crate::config::PIPE_CAPACITY_CHUNKS;
use crate::engine::stats::{TransferStats, TransferStatsSnapshot};
use crate::error::ProviderError;

/// The only access mode the provider accepts.
pub const READ_ONLY_MODE: &str = "r";

/// Readable descriptor over a resource, as returned by `open_asset_file`.
pub struct AssetDescriptor {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub start_offset: u64,
    /// `None` when the data is streamed through a pipe.
    pub length: Option<u64>,
}

impl std::fmt::Debug for AssetDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetDescriptor")
            .field("start_offset", &self.start_offset)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

pub struct AppContentProvider {
    matcher: UriMatcher,
    resources: Arc<dyn RawResources>,
    /// Parent of every transfer's scope token.
    scope: CancellationToken,
    stats: Arc<TransferStats>,
}

impl AppContentProvider {
    pub fn new(authority: impl Into<String>, resources: Arc<dyn RawResources>) -> Self {
        Self {
            matcher: UriMatcher::new(authority),
            resources,
            scope: CancellationToken::new(),
            stats: Arc::new(TransferStats::new()),
        }
    }

    pub fn matcher(&self) -> &UriMatcher {
        &self.matcher
    }

    /// MIME type of the file behind `uri`.
    pub fn get_type(&self, uri: &str) -> Option<&'static str> {
        debug!("get_type uri: {}", uri);
        self.matcher.match_uri(uri).map(ProviderFile::mime_type)
    }

    /// Concrete stream types of `uri` matching `mime_filter`.
    pub fn get_stream_types(&self, uri: &str, mime_filter: &str) -> Option<Vec<String>> {
        debug!("get_stream_types uri: {}, mime_filter: {}", uri, mime_filter);
        self.matcher.match_uri(uri)?.stream_types(mime_filter)
    }

    /// Open `uri` for reading through a pipe.
    ///
    /// The readable end is returned as soon as the resource is found; the copy
    /// runs as its own task and checks `signal` before every chunk. Failures
    /// after this call returns are only visible to the reader.
    pub async fn open_file(
        &self,
        uri: &str,
        mode: &str,
        signal: Option<CancellationToken>,
    ) -> Result<ReadableHandle, ProviderError> {
        debug!("open_file uri: {}, mode: {}, signal: {}", uri, mode, signal.is_some());
        ensure_read_only(mode)?;

        let file = self
            .matcher
            .match_uri(uri)
            .ok_or_else(|| ProviderError::NotFound(uri.to_string()))?;
        self.transfer_raw_resource(file.resource_id(), signal).await
    }

    /// Open `uri` as an asset descriptor.
    ///
    /// Known files are opened directly with their length; anything else falls
    /// back to `open_file`.
    pub async fn open_asset_file(
        &self,
        uri: &str,
        mode: &str,
        signal: Option<CancellationToken>,
    ) -> Result<AssetDescriptor, ProviderError> {
        debug!("open_asset_file uri: {}, mode: {}, signal: {}", uri, mode, signal.is_some());
        ensure_read_only(mode)?;

        match self.matcher.match_uri(uri) {
            Some(file) => {
                let opened = self.resources.open(file.resource_id()).await?;
                Ok(AssetDescriptor {
                    reader: opened.reader,
                    start_offset: 0,
                    length: Some(opened.length),
                })
            }
            None => {
                let handle = self.open_file(uri, mode, signal).await?;
                Ok(AssetDescriptor {
                    reader: Box::new(handle),
                    start_offset: 0,
                    length: None,
                })
            }
        }
    }

    async fn transfer_raw_resource(
        &self,
        resource_id: &str,
        signal: Option<CancellationToken>,
    ) -> Result<ReadableHandle, ProviderError> {
        let opened = self.resources.open(resource_id).await?;

        let (writer, reader) = create_pipe(PIPE_CAPACITY_CHUNKS);
        let request = StreamRequest::new(resource_id, writer, self.scope.child_token(), signal);
        spawn_transfer(request, opened.reader, Arc::clone(&self.stats));

        Ok(reader)
    }

    pub fn stats(&self) -> TransferStatsSnapshot {
        self.stats.snapshot()
    }

    /// Cancel every in-flight transfer at its next chunk boundary.
    pub fn shutdown(&self) {
        info!("content provider {} shutting down", self.matcher.authority());
        self.scope.cancel();
    }
}

impl Drop for AppContentProvider {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

fn ensure_read_only(mode: &str) -> Result<(), ProviderError> {
    if mode != READ_ONLY_MODE {
        return Err(ProviderError::InvalidMode(mode.to_string()));
    }
    Ok(())
}
