use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::policy::types::DataSource;

/// Payload of one completed fetch.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Bytes,
    pub content_type: String,
    pub data_source: DataSource,
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Whether this source can load `model`.
    fn handles(&self, model: &str) -> bool;
    async fn fetch(&self, model: &str) -> Result<FetchedImage>;
}
