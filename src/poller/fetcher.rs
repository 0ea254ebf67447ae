//! Fetching and decoding the booking endpoint's item list.
//!
//! [`HttpItemSource`] issues one time-bounded GET per poll, inflates a gzip
//! body when the server says so, and decodes a JSON array of [`Item`]s.
//! Any failure surfaces as a [`PollError`]; nothing is retried here.

use std::fmt;
use std::io::Read;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONTENT_ENCODING, HeaderMap, HeaderName, HeaderValue,
    USER_AGENT,
};
use reqwest::{Client, Url};

use crate::config::RequestConfig;
use crate::domain::Item;
use crate::error::PollError;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Source of decoded items for one poll cycle.
#[async_trait]
pub trait ItemSource: Send + Sync + fmt::Debug {
    /// Fetches and decodes the current item list.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError`] on transport, status, or decoding failure.
    async fn fetch(&self) -> Result<Vec<Item>, PollError>;
}

/// [`ItemSource`] backed by the remote booking endpoint.
#[derive(Debug, Clone)]
pub struct HttpItemSource {
    client: Client,
    url: Url,
}

impl HttpItemSource {
    /// Builds the client and the request URL from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::InvalidUrl`] if scheme, host and path do not form
    /// a URL, or [`PollError::Request`] if the HTTP client cannot be built.
    pub fn new(config: &RequestConfig) -> Result<Self, PollError> {
        let url = endpoint_url(config)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers())
            .build()?;
        Ok(Self { client, url })
    }

    /// The fully built request URL, query string included.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ItemSource for HttpItemSource {
    async fn fetch(&self) -> Result<Vec<Item>, PollError> {
        tracing::debug!(url = %self.url, "requesting items");
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status));
        }

        let gzipped = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"));

        let body = response.bytes().await?;
        decode_items(&body, gzipped)
    }
}

/// Builds `scheme://host/path?point_from_id=..&point_to_id=..&date=..&direction_id=..`.
///
/// # Errors
///
/// Returns [`PollError::InvalidUrl`] if scheme and host do not parse.
pub fn endpoint_url(config: &RequestConfig) -> Result<Url, PollError> {
    let mut url = Url::parse(&format!("{}://{}", config.scheme, config.host))
        .map_err(|e| PollError::InvalidUrl(format!("{}://{}: {e}", config.scheme, config.host)))?;
    url.set_path(&config.path);
    url.query_pairs_mut().extend_pairs(config.query_pairs());
    Ok(url)
}

/// Decodes a response body, inflating it first when `gzipped`.
///
/// # Errors
///
/// Returns [`PollError::Decompress`] for a corrupt gzip stream and
/// [`PollError::Decode`] if the payload is not a JSON array of items.
pub fn decode_items(body: &[u8], gzipped: bool) -> Result<Vec<Item>, PollError> {
    if gzipped {
        let mut inflated = Vec::with_capacity(body.len().saturating_mul(4));
        GzDecoder::new(body)
            .read_to_end(&mut inflated)
            .map_err(PollError::Decompress)?;
        Ok(serde_json::from_slice(&inflated)?)
    } else {
        Ok(serde_json::from_slice(body)?)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        HeaderName::from_static("source"),
        HeaderValue::from_static("site"),
    );
    headers
}
