use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncReadExt;

use super::model::ModelKind;
use super::traits::{FetchedImage, ImageSource};
use crate::provider::content_provider::{AppContentProvider, READ_ONLY_MODE};

/// Loads `content://` models through the in-process content provider.
pub struct ProviderImageSource {
    provider: Arc<AppContentProvider>,
}

impl ProviderImageSource {
    pub fn new(provider: Arc<AppContentProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ImageSource for ProviderImageSource {
    fn handles(&self, model: &str) -> bool {
        ModelKind::classify(model) == Some(ModelKind::Content)
    }

    async fn fetch(&self, uri: &str) -> Result<FetchedImage> {
        let content_type = self
            .provider
            .get_type(uri)
            .ok_or_else(|| anyhow!("no provider type for {}", uri))?;

        let mut handle = self.provider.open_file(uri, READ_ONLY_MODE, None).await?;
        let mut data = Vec::new();
        handle.read_to_end(&mut data).await?;

        Ok(FetchedImage {
            bytes: Bytes::from(data),
            content_type: content_type.to_string(),
            data_source: ModelKind::Content.data_source(),
        })
    }
}
