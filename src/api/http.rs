use super::{ApiError, ListApi};
use crate::config::Config;
use crate::fetch::{PageResult, RequestDescriptor};
use crate::screen::Screen;
use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::marker::PhantomData;
use std::time::Duration;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// [`ListApi`] over HTTP: `GET {base}/{endpoint}?search=..&page=..&limit=..&<filters>`.
pub struct HttpListApi<S> {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    timeout: Duration,
    _screen: PhantomData<fn() -> S>,
}

impl<S: Screen> HttpListApi<S> {
    /// Create a client for `base_url`.
    ///
    /// The base URL must be HTTPS; plain HTTP is accepted only for
    /// `localhost`/`127.0.0.1` so a bearer token never crosses the network
    /// in clear text.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        check_scheme(&base_url)?;

        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            token,
            timeout,
            _screen: PhantomData,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()?;
        Self::new(
            client,
            &config.api_base_url,
            config.resolved_token().map(SecretString::from),
            timeout,
        )
    }

    /// Full request URL for `request`.
    pub fn request_url(&self, request: &RequestDescriptor<S::Field>) -> Result<Url, ApiError> {
        let mut url = self.base_url.join(S::ENDPOINT)?;
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        Ok(url)
    }
}

#[async_trait]
impl<S: Screen> ListApi<S> for HttpListApi<S> {
    async fn fetch_page(
        &self,
        request: &RequestDescriptor<S::Field>,
    ) -> Result<PageResult<S::Item>, ApiError> {
        let url = self.request_url(request)?;
        tracing::debug!(screen = S::NAME, page = request.page, url = %url.path(), "Fetching page");

        let mut builder = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;

        let status = response.status();
        let body = tokio::time::timeout(self.timeout, read_limited(response, MAX_RESPONSE_SIZE))
            .await
            .map_err(|_| ApiError::Timeout)??;

        if !status.is_success() {
            let message = server_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("HTTP error")
                    .to_string()
            });
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let page: PageResult<S::Item> =
            serde_json::from_slice(&body).map_err(|e| ApiError::Malformed(e.to_string()))?;
        if let Err(reason) = page.validate(request) {
            tracing::warn!(screen = S::NAME, reason = %reason, "Rejecting malformed page");
            return Err(ApiError::Malformed(reason));
        }
        Ok(page)
    }
}

fn check_scheme(url: &Url) -> Result<(), ApiError> {
    match url.scheme() {
        "https" => Ok(()),
        "http" => {
            let is_localhost = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
            if is_localhost {
                tracing::warn!(base_url = %url, "Using non-HTTPS API base URL (localhost only)");
                Ok(())
            } else {
                tracing::error!(base_url = %url, "Rejecting non-HTTPS base URL");
                Err(ApiError::InsecureBaseUrl)
            }
        }
        _ => Err(ApiError::InsecureBaseUrl),
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `message`, `detail` and `error` in that order.
fn server_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["message", "detail", "error"]
        .iter()
        .find_map(|key| value.get(*key)?.as_str().map(str::to_string))
        .filter(|m| !m.trim().is_empty())
}

async fn read_limited(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
