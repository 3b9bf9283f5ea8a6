use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use super::model::ModelKind;
use super::traits::{FetchedImage, ImageSource};
use crate::engine::http_cache::HttpCache;

/// Content type reported when the response carries none.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Whether a `200` response with this `Cache-Control` value may be stored.
///
/// Entries are served without revalidation, so anything that asks for
/// revalidation or is marked private is not stored.
fn is_storable(cache_control: Option<&str>) -> bool {
    let Some(cache_control) = cache_control else {
        return true;
    };
    !cache_control.split(',').any(|directive| {
        let directive = directive.trim().to_ascii_lowercase();
        match directive.split_once('=') {
            Some((name, value)) => {
                name.trim() == "max-age"
                    && value.trim().trim_matches('"').parse::<u64>() == Ok(0)
            }
            None => matches!(directive.as_str(), "no-store" | "no-cache" | "private"),
        }
    })
}

/// Network source backed by the host's shared client and transport cache.
pub struct HttpImageSource {
    client: Client,
    cache: Option<Arc<HttpCache>>,
    headers: RwLock<HashMap<String, String>>,
}

impl HttpImageSource {
    pub fn new(client: Client, cache: Option<Arc<HttpCache>>) -> Self {
        Self {
            client,
            cache,
            headers: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the extra request headers (e.g. after a token refresh).
    pub fn set_headers(&self, headers: HashMap<String, String>) {
        *self.headers.write() = headers;
    }

    fn build_request(&self, url: &str) -> RequestBuilder {
        let headers = self.headers.read().clone();
        let mut req = self.client.get(url);
        for (k, v) in &headers {
            req = req.header(k.as_str(), v.as_str());
        }
        req
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    fn handles(&self, model: &str) -> bool {
        ModelKind::classify(model) == Some(ModelKind::Http)
    }

    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        if let Some(cache) = &self.cache {
            match cache.get(url).await {
                // A transport cache hit is still a remote load as far as admission goes.
                Ok(Some(cached)) => {
                    return Ok(FetchedImage {
                        bytes: cached.body,
                        content_type: cached.content_type,
                        data_source: ModelKind::Http.data_source(),
                    });
                }
                Ok(None) => {}
                Err(e) => warn!("http cache read failed for {}: {}", url, e),
            }
        }

        let resp = self.build_request(url).send().await?;

        let status = resp.status();
        debug!("http fetch status={} url={}", status.as_u16(), url);
        if status.as_u16() == 401 || status.as_u16() == 403 {
            warn!("http fetch auth rejected status={} url={}", status.as_u16(), url);
            return Err(anyhow!("auth_rejected: HTTP {}", status.as_u16()));
        }
        if !status.is_success() {
            warn!("http fetch failed status={} url={}", status.as_u16(), url);
            return Err(anyhow!("fetch failed: HTTP {}", status.as_u16()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let storable = status.as_u16() == 200
            && is_storable(resp.headers().get(CACHE_CONTROL).and_then(|v| v.to_str().ok()));

        let bytes = resp.bytes().await?;
        debug!("http fetch body url={} bytes={} type={}", url, bytes.len(), content_type);

        if storable {
            if let Some(cache) = &self.cache {
                if let Err(e) = cache.put(url, &content_type, &bytes).await {
                    warn!("http cache write failed for {}: {}", url, e);
                }
            }
        }

        Ok(FetchedImage {
            bytes,
            content_type,
            data_source: ModelKind::Http.data_source(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storable_cache_control() {
        assert!(is_storable(None));
        assert!(is_storable(Some("public, max-age=3600")));
        assert!(is_storable(Some("max-age=10")));

        assert!(!is_storable(Some("no-store")));
        assert!(!is_storable(Some("No-Cache")));
        assert!(!is_storable(Some("no-cache, max-age=0")));
        assert!(!is_storable(Some("public, max-age=0")));
        assert!(!is_storable(Some("private, max-age=600")));
    }
}
