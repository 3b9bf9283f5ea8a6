use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::model::ModelKind;
use super::traits::{FetchedImage, ImageSource};
use crate::provider::resources::RawResources;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Content type from the leading bytes of a packaged image.
fn sniff_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(PNG_SIGNATURE) {
        "image/png"
    } else if bytes.starts_with(b"BM") {
        "image/bmp"
    } else {
        "application/octet-stream"
    }
}

/// Loads `android.resource://<package>/[<type>/]<name>` models straight from
/// the packaged raw resources.
pub struct ResourceImageSource {
    package_name: String,
    resources: Arc<dyn RawResources>,
}

impl ResourceImageSource {
    pub fn new(package_name: impl Into<String>, resources: Arc<dyn RawResources>) -> Self {
        Self {
            package_name: package_name.into(),
            resources,
        }
    }

    /// Raw resource name addressed by `model`, if it belongs to this package.
    fn resource_name(&self, model: &str) -> Option<String> {
        let url = Url::parse(model.trim()).ok()?;
        if url.scheme() != "android.resource" || url.host_str()? != self.package_name {
            return None;
        }
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [name] | [_, name] => Some((*name).to_string()),
            _ => None,
        }
    }
}

#[async_trait]
impl ImageSource for ResourceImageSource {
    fn handles(&self, model: &str) -> bool {
        ModelKind::classify(model) == Some(ModelKind::AndroidResource)
    }

    async fn fetch(&self, model: &str) -> Result<FetchedImage> {
        let name = self
            .resource_name(model)
            .ok_or_else(|| anyhow!("not a resource of {}: {}", self.package_name, model))?;

        let mut opened = self.resources.open(&name).await?;
        let mut data = Vec::with_capacity(opened.length as usize);
        opened.reader.read_to_end(&mut data).await?;

        let content_type = sniff_content_type(&data);
        debug!("resource fetch {} bytes={} type={}", name, data.len(), content_type);

        Ok(FetchedImage {
            bytes: Bytes::from(data),
            content_type: content_type.to_string(),
            data_source: ModelKind::AndroidResource.data_source(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::resources::MemoryResources;

    fn source() -> ResourceImageSource {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(&[0u8; 16]);
        let resources = MemoryResources::new()
            .with("image_3840x2160", png)
            .with("image_3840x2160_bmp", b"BM\0\0".to_vec());
        ResourceImageSource::new("com.example.glide", Arc::new(resources))
    }

    #[test]
    fn test_resource_name_forms() {
        let s = source();
        assert_eq!(
            s.resource_name("android.resource://com.example.glide/image_3840x2160"),
            Some("image_3840x2160".to_string())
        );
        assert_eq!(
            s.resource_name("android.resource://com.example.glide/raw/image_3840x2160_bmp"),
            Some("image_3840x2160_bmp".to_string())
        );
        assert_eq!(s.resource_name("android.resource://other.app/image_3840x2160"), None);
        assert_eq!(s.resource_name("android.resource://com.example.glide/"), None);
        assert_eq!(s.resource_name("android.resource://com.example.glide/a/b/c"), None);
    }

    #[tokio::test]
    async fn test_fetch_reports_local_with_sniffed_type() {
        let s = source();
        let png = s
            .fetch("android.resource://com.example.glide/image_3840x2160")
            .await
            .unwrap();
        assert_eq!(png.content_type, "image/png");
        assert_eq!(png.bytes.len(), PNG_SIGNATURE.len() + 16);
        assert_eq!(png.data_source, crate::policy::types::DataSource::Local);

        let bmp = s
            .fetch("android.resource://com.example.glide/raw/image_3840x2160_bmp")
            .await
            .unwrap();
        assert_eq!(bmp.content_type, "image/bmp");

        assert!(s
            .fetch("android.resource://com.example.glide/missing")
            .await
            .is_err());
        assert!(s
            .fetch("android.resource://other.app/image_3840x2160")
            .await
            .is_err());
    }
}
