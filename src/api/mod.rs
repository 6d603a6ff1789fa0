//! Remote list API seam.
//!
//! The coordinator only ever talks to a [`ListApi`]. Production code uses
//! [`HttpListApi`]; tests inject their own implementations.

mod http;

pub use http::HttpListApi;

use crate::fetch::{PageResult, RequestDescriptor};
use crate::screen::Screen;
use async_trait::async_trait;
use thiserror::Error;

/// Failures of a list fetch.
///
/// All variants reach the view the same way, as their display text.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Non-2xx response, with the server's message when it sent one
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },
    /// Body was not a valid page envelope
    #[error("Unexpected response: {0}")]
    Malformed(String),
    /// Response body exceeded the size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Base URL is plain HTTP on a non-local host
    #[error("Insecure base URL: HTTPS required (except localhost)")]
    InsecureBaseUrl,
    /// Base URL could not be parsed or joined
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Fetches one page of a screen's list.
#[async_trait]
pub trait ListApi<S: Screen>: Send + Sync + 'static {
    async fn fetch_page(
        &self,
        request: &RequestDescriptor<S::Field>,
    ) -> Result<PageResult<S::Item>, ApiError>;
}
