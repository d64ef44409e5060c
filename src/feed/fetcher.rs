use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use std::time::Duration;

use super::error::{NetworkCause, NetworkError};
use crate::config::ParserConfig;

/// Validators from a previous response, sent so the server can answer 304.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalHeaders {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl ConditionalHeaders {
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }

    fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(etag) = &self.etag {
            match HeaderValue::from_str(etag) {
                Ok(value) => {
                    headers.insert(IF_NONE_MATCH, value);
                }
                Err(_) => tracing::debug!(etag = %etag, "Cached ETag is not a valid header value"),
            }
        }

        if let Some(last_modified) = &self.last_modified {
            match HeaderValue::from_str(last_modified) {
                Ok(value) => {
                    headers.insert(IF_MODIFIED_SINCE, value);
                }
                Err(_) => tracing::debug!(
                    last_modified = %last_modified,
                    "Cached Last-Modified is not a valid header value"
                ),
            }
        }

        headers
    }
}

/// A successful (2xx) or not-modified (304) response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

impl FetchResponse {
    pub fn is_not_modified(&self) -> bool {
        self.status == StatusCode::NOT_MODIFIED.as_u16()
    }

    pub fn etag(&self) -> Option<String> {
        header_string(&self.headers, ETAG.as_str())
    }

    pub fn last_modified(&self) -> Option<String> {
        header_string(&self.headers, LAST_MODIFIED.as_str())
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// HTTP GET with a per-attempt deadline and transport-level retries.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
    max_body_bytes: usize,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, config: &ParserConfig) -> Self {
        Self {
            client,
            timeout: config.timeout(),
            retry_attempts: config.retry_attempts,
            retry_delay: config.retry_delay(),
            max_body_bytes: config.max_feed_bytes,
        }
    }

    /// Fetches `url`, adding `If-None-Match`/`If-Modified-Since` from `conditional`.
    ///
    /// # Behavior
    ///
    /// - Timeouts and connection/DNS/stream failures are retried up to
    ///   `retry_attempts` more times, backing off `retry_delay * 2^n`
    /// - Status >= 400 fails immediately without retry
    /// - 304 is returned as-is when validators were sent
    ///
    /// # Errors
    ///
    /// [`NetworkError`] carrying `url`, the number of attempts made and the
    /// last failure.
    pub async fn fetch(
        &self,
        url: &str,
        conditional: Option<&ConditionalHeaders>,
    ) -> Result<FetchResponse, NetworkError> {
        let conditional = conditional.filter(|c| !c.is_empty());
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.fetch_once(url, conditional).await {
                Ok(response) => {
                    tracing::debug!(
                        url = %url,
                        status = response.status,
                        attempt = attempt,
                        bytes = response.body.len(),
                        "Fetched"
                    );
                    return Ok(response);
                }
                Err(cause) if cause.is_retryable() && attempt <= self.retry_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        url = %url,
                        error = %cause,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Fetch failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(cause) => {
                    return Err(NetworkError {
                        url: url.to_string(),
                        attempts: attempt,
                        cause,
                    });
                }
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(10);
        self.retry_delay.saturating_mul(factor)
    }

    async fn fetch_once(
        &self,
        url: &str,
        conditional: Option<&ConditionalHeaders>,
    ) -> Result<FetchResponse, NetworkCause> {
        let validators = conditional.map(ConditionalHeaders::to_header_map).unwrap_or_default();
        // Only a request that actually carried a validator may be answered with 304
        let is_conditional = !validators.is_empty();
        let request = self.client.get(url).headers(validators);

        tokio::time::timeout(self.timeout, self.exchange(request, is_conditional))
            .await
            .map_err(|_| NetworkCause::Timeout(self.timeout))?
    }

    async fn exchange(
        &self,
        request: reqwest::RequestBuilder,
        conditional: bool,
    ) -> Result<FetchResponse, NetworkCause> {
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        if status == StatusCode::NOT_MODIFIED {
            if !conditional {
                return Err(NetworkCause::UnexpectedNotModified);
            }
            return Ok(FetchResponse {
                status: status.as_u16(),
                body: Vec::new(),
                headers,
            });
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(NetworkCause::HttpStatus(status.as_u16()));
        }

        let body = read_limited_bytes(response, self.max_body_bytes).await?;
        Ok(FetchResponse {
            status: status.as_u16(),
            body,
            headers,
        })
    }
}

/// Reads a response body, refusing anything over `limit` bytes and flagging
/// bodies shorter than their declared Content-Length.
pub(crate) async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, NetworkCause> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(NetworkCause::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(NetworkCause::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(NetworkCause::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
