//! Transports carry proxy calls to a server: over HTTP with reqwest, or in process through an axum Router.

use crate::config::HttpVerb;
use crate::error::ProxyError;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

/// One outgoing call. `path` is absolute from the server root (prefix included).
#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
    pub verb: HttpVerb,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Err only when no response was received; any HTTP status is a response.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ProxyError>;
}

/// Fixed headers attached to every call, e.g. `X-User-Id`.
type Headers = Vec<(String, String)>;

/// HTTP transport over reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    headers: Headers,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers: Vec::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ProxyError> {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!(verb = %request.verb, url = %url, "proxy call");
        let mut builder = self.client.request(request.verb.to_method(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| ProxyError::Transport(format!("{} {}: {}", request.verb, url, e)))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ProxyError::Transport(format!("reading response: {}", e)))?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// In-process transport: dispatches through `tower::ServiceExt::oneshot` without binding a port.
#[derive(Clone)]
pub struct RouterTransport {
    router: Router,
    headers: Headers,
}

impl RouterTransport {
    pub fn new(router: Router) -> Self {
        RouterTransport {
            router,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Path plus percent-encoded query string.
fn request_uri(path: &str, query: &[(String, String)]) -> Result<String, ProxyError> {
    if query.is_empty() {
        return Ok(path.to_string());
    }
    let mut url = reqwest::Url::parse(&format!("http://localhost{}", path))
        .map_err(|e| ProxyError::Transport(format!("invalid path {}: {}", path, e)))?;
    url.query_pairs_mut().extend_pairs(query.iter());
    Ok(format!("{}?{}", url.path(), url.query().unwrap_or_default()))
}

#[async_trait]
impl Transport for RouterTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ProxyError> {
        let uri = request_uri(&request.path, &request.query)?;
        let mut builder = Request::builder().method(request.verb.to_method()).uri(&uri);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let body = match &request.body {
            Some(v) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                let bytes = serde_json::to_vec(v).map_err(|e| ProxyError::Transport(e.to_string()))?;
                Body::from(bytes)
            }
            None => Body::empty(),
        };
        let req = builder
            .body(body)
            .map_err(|e| ProxyError::Transport(format!("building request: {}", e)))?;
        let resp = self
            .router
            .clone()
            .oneshot(req)
            .await
            .map_err(|e| ProxyError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ProxyError::Transport(format!("reading response: {}", e)))?
            .to_bytes();
        Ok(TransportResponse {
            status,
            body: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_percent_encoded() {
        let uri = request_uri(
            "/api/app/book",
            &[("sorting".into(), "price desc".into()), ("name".into(), "a&b".into())],
        )
        .unwrap();
        assert_eq!(uri, "/api/app/book?sorting=price+desc&name=a%26b");
    }

    #[test]
    fn no_query_keeps_path() {
        assert_eq!(request_uri("/book/1", &[]).unwrap(), "/book/1");
    }
}
