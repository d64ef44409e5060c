use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`FeedParser::parse_feed`](super::FeedParser::parse_feed).
///
/// Callers branch on the variant: a network failure may be worth retrying
/// later, a malformed document should be refused, and a well-formed document
/// that is not a podcast feed is usually reported back to the user.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport or HTTP failure while fetching the feed.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// The body is not well-formed XML.
    #[error("Malformed XML at byte {position}: {message}")]
    XmlParse { position: u64, message: String },
    /// Well-formed XML without the structure of an RSS channel.
    #[error("Not a valid RSS feed: {0}")]
    FeedParse(String),
}

/// A failed fetch of `url`, after `attempts` tries.
#[derive(Debug, Error)]
#[error("Failed to fetch {url} after {attempts} attempt(s): {cause}")]
pub struct NetworkError {
    pub url: String,
    pub attempts: u32,
    #[source]
    pub cause: NetworkCause,
}

/// Underlying reason for a [`NetworkError`].
#[derive(Debug, Error)]
pub enum NetworkCause {
    /// A single attempt exceeded the configured deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Connection, DNS, TLS or body-stream failure
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Response with status >= 400
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the configured limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Response ended before Content-Length bytes arrived
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// 304 received for a request that carried no validators
    #[error("Server answered 304 Not Modified to an unconditional request")]
    UnexpectedNotModified,
}

impl NetworkCause {
    /// Returns true for retransmission-style failures. HTTP error statuses are
    /// never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkCause::Timeout(_) | NetworkCause::IncompleteResponse { .. } => true,
            // Malformed URLs and redirect loops fail the same way every time
            NetworkCause::Transport(e) => !(e.is_builder() || e.is_redirect()),
            NetworkCause::HttpStatus(_)
            | NetworkCause::ResponseTooLarge(_)
            | NetworkCause::UnexpectedNotModified => false,
        }
    }
}

impl FeedError {
    /// The requested URL for network failures.
    pub fn url(&self) -> Option<&str> {
        match self {
            FeedError::Network(e) => Some(&e.url),
            FeedError::XmlParse { .. } | FeedError::FeedParse(_) => None,
        }
    }
}
