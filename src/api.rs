// API client module: a small blocking HTTP client that talks to the
// catalog backend. Requests are described by `ApiRequest` and go through
// the `Transport` trait so the orchestrator can run against any backend.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, PRAGMA};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::Config;
use crate::endpoints::{Auth, Endpoint};
use crate::error::{ClientError, Result};
use crate::models::ErrorBody;

/// One outgoing request, already resolved to a route.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
    /// Bypass any HTTP cache between us and the backend.
    pub no_store: bool,
}

impl ApiRequest {
    /// Build a request for `endpoint`, attaching the token as its auth
    /// mode allows.
    pub fn new(endpoint: Endpoint, token: Option<&str>) -> Self {
        let bearer = match endpoint.auth {
            Auth::None => None,
            Auth::Optional | Auth::Bearer => token.map(str::to_string),
        };
        ApiRequest {
            method: endpoint.method,
            segments: endpoint.segments,
            bearer,
            body: None,
            no_store: false,
        }
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn no_store(mut self) -> Self {
        self.no_store = true;
        self
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Raw response: status code plus body text.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// The server's `detail` message, if the body carries one.
    pub fn detail(&self) -> Option<String> {
        serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(|b| b.message())
    }

    /// Turn a non-2xx response into a server error. `fallback` is used
    /// when the payload has no `detail`.
    pub fn error_for_status(self, fallback: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self
            .detail()
            .unwrap_or_else(|| format!("{} (HTTP {})", fallback, self.status));
        Err(ClientError::Server {
            status: self.status,
            message,
        })
    }
}

/// Sends one request and returns the raw response. Errors are reserved
/// for requests that produced no response at all.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport for the real backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create an ApiClient for the configured backend. No request timeout
    /// is set: a slow response simply arrives late.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        use anyhow::Context;
        let base_url = Url::parse(&config.api_base_url)
            .with_context(|| format!("Invalid API URL: {}", config.api_base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API URL cannot be used as a base: {}", base_url);
        }
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for a request; segments are percent-encoded individually.
    pub fn url_for(&self, request: &ApiRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(request.segments.iter());
        }
        url
    }

    /// Helper to build the header map for a request.
    fn headers(&self, request: &ApiRequest) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(t) = &request.bearer {
            let val = HeaderValue::from_str(&format!("Bearer {}", t))
                .map_err(|_| ClientError::network("Session token is not a valid header value"))?;
            headers.insert(AUTHORIZATION, val);
        }
        if request.no_store {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, no-cache"));
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        }
        Ok(headers)
    }
}

impl Transport for ApiClient {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(request);
        tracing::debug!(method = %request.method, %url, "sending request");
        let mut req = self
            .client
            .request(request.method.clone(), url)
            .headers(self.headers(request)?);
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        let res = req.send()?;
        let status = res.status().as_u16();
        let body = res.text()?;
        tracing::debug!(status, "response received");
        Ok(ApiResponse { status, body })
    }
}
