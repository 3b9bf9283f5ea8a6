// Axum request handler: exposes the content provider's files to local clients over HTTP.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tracing::{debug, error};

use crate::error::ProviderError;
use crate::provider::content_provider::{AppContentProvider, READ_ONLY_MODE};

pub struct ProviderServer {
    port: u16,
    provider: Arc<AppContentProvider>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl ProviderServer {
    /// Start the server on a random loopback port, returning a handle.
    pub async fn start(provider: Arc<AppContentProvider>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = Router::new()
            .route("/file/{name}", get(file_handler).head(head_handler))
            .with_state(provider.clone());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            port,
            provider,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Build the URL serving the provider file `name` (e.g. `image-3840x2160.png`).
    pub fn url_for_file(&self, name: &str) -> String {
        format!("http://127.0.0.1:{}/file/{}", self.port, name)
    }

    pub fn provider(&self) -> &Arc<AppContentProvider> {
        &self.provider
    }

    /// Shutdown the server gracefully.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn content_uri(provider: &AppContentProvider, name: &str) -> String {
    format!("content://{}/file/{}", provider.matcher().authority(), name)
}

fn error_response(e: ProviderError) -> Response {
    let status = match &e {
        ProviderError::InvalidMode(_) => StatusCode::BAD_REQUEST,
        ProviderError::NotFound(_) => StatusCode::NOT_FOUND,
        ProviderError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("provider error: {}", e);
    }
    (status, e.to_string()).into_response()
}

/// Content type to answer with, given the request's `Accept` header.
///
/// `Err` carries the response to send when nothing acceptable is available.
fn negotiate(
    provider: &AppContentProvider,
    uri: &str,
    headers: &HeaderMap,
) -> Result<&'static str, Response> {
    let Some(content_type) = provider.get_type(uri) else {
        return Err(error_response(ProviderError::NotFound(uri.to_string())));
    };

    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty());
    let Some(accept) = accept else {
        return Ok(content_type);
    };

    let acceptable = accept_ranges(accept).any(|range| {
        range == "*/*"
            || range == content_type
            || provider.get_stream_types(uri, range).is_some()
    });
    if acceptable {
        Ok(content_type)
    } else {
        Err((StatusCode::NOT_ACCEPTABLE, "no matching stream type").into_response())
    }
}

/// Media ranges of an `Accept` header, parameters stripped. Ranges with `q=0`
/// are refused by the client and skipped.
fn accept_ranges(accept: &str) -> impl Iterator<Item = &str> {
    accept.split(',').filter_map(|entry| {
        let mut parts = entry.split(';').map(str::trim);
        let range = parts.next().filter(|r| !r.is_empty())?;
        let refused = parts.any(|param| {
            param
                .strip_prefix("q=")
                .and_then(|q| q.parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        });
        (!refused).then_some(range)
    })
}

/// GET /file/{name}: stream a provider file.
async fn file_handler(
    State(provider): State<Arc<AppContentProvider>>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let uri = content_uri(&provider, &name);
    let mode = params.get("mode").map(String::as_str).unwrap_or(READ_ONLY_MODE);

    debug!("file request uri={} mode={}", uri, mode);

    // Mode is validated before anything else, as open_file does.
    if mode != READ_ONLY_MODE {
        return error_response(ProviderError::InvalidMode(mode.to_string()));
    }

    let content_type = match negotiate(&provider, &uri, &headers) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    // Dropping the body when the client goes away closes the pipe, which stops the transfer.
    match provider.open_file(&uri, mode, None).await {
        Ok(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type)],
            Body::from_stream(handle.into_stream()),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// HEAD /file/{name}: return headers only.
async fn head_handler(
    State(provider): State<Arc<AppContentProvider>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let uri = content_uri(&provider, &name);
    match negotiate(&provider, &uri, &headers) {
        Ok(content_type) => (StatusCode::OK, [(header::CONTENT_TYPE, content_type)]).into_response(),
        Err(resp) => resp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::resources::MemoryResources;

    fn provider() -> AppContentProvider {
        AppContentProvider::new("test.provider", Arc::new(MemoryResources::new()))
    }

    fn accept(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_negotiate_defaults_to_file_type() {
        let p = provider();
        let uri = content_uri(&p, "image-3840x2160.png");
        assert!(matches!(negotiate(&p, &uri, &HeaderMap::new()), Ok("image/png")));
        assert!(matches!(negotiate(&p, &uri, &accept("image/*")), Ok("image/png")));
    }

    #[test]
    fn test_negotiate_rejects_mismatch() {
        let p = provider();
        let uri = content_uri(&p, "image-3840x2160.bmp");
        let resp = negotiate(&p, &uri, &accept("*/png")).unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn test_negotiate_unknown_file() {
        let p = provider();
        let uri = content_uri(&p, "unknown.png");
        let resp = negotiate(&p, &uri, &HeaderMap::new()).unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_negotiate_browser_accept() {
        let p = provider();
        let png = content_uri(&p, "image-3840x2160.png");
        let browser = accept("image/avif,image/webp,image/png,*/*;q=0.8");
        assert!(matches!(negotiate(&p, &png, &browser), Ok("image/png")));

        let bmp = content_uri(&p, "image-3840x2160.bmp");
        assert!(matches!(
            negotiate(&p, &bmp, &accept("image/webp, image/*;q=0.5")),
            Ok("image/bmp")
        ));
        let resp = negotiate(&p, &bmp, &accept("image/webp, */png, */*;q=0")).unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn test_accept_ranges_strip_params() {
        let ranges: Vec<&str> = accept_ranges("text/html, image/png;q=0.9 , */*;q=0").collect();
        assert_eq!(ranges, vec!["text/html", "image/png"]);
    }
}
