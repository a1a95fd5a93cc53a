//! Error taxonomy shared by the transport, the parsers and the orchestrator.
//!
//! Missing fields are never errors; a page either parses (possibly to an
//! empty list) or the whole operation fails with one of these variants.

/// Errors surfaced by a [`crate::traits::ProductSource`] operation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// DNS, connect, timeout or body read failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with a non-2xx status.
    #[error("unexpected status {status} from {url}: {excerpt}")]
    Status {
        url: String,
        status: u16,
        excerpt: String,
    },

    /// The body could not be read as a text document at all.
    #[error("response from {url} is not a parseable document: {reason}")]
    Unparseable { url: String, reason: String },

    /// The upstream served a bot-challenge interstitial instead of content.
    #[error("{url} is blocked by a bot challenge; an interactive browser or API token is required")]
    Blocked { url: String },

    /// The source does not offer this optional capability.
    #[error("{0} is not supported by this source")]
    Unsupported(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Whether repeating the same request may succeed.
    ///
    /// Block pages and unparseable bodies are terminal; timeouts, throttling
    /// and server errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::Unparseable { .. } | Self::Blocked { .. } | Self::Unsupported(_) => false,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Attaches the request URL to an error raised before it was known.
    pub(crate) fn at(self, request_url: &str) -> Self {
        match self {
            Self::Unparseable { url, reason } if url.is_empty() => Self::Unparseable {
                url: request_url.to_string(),
                reason,
            },
            Self::Blocked { url } if url.is_empty() => Self::Blocked {
                url: request_url.to_string(),
            },
            other => other,
        }
    }
}
