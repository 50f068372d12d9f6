use chatkit_tokens::SigningError;
use reqwest::StatusCode;
use thiserror::Error;

/// A service URL could not be formed
#[derive(Debug, Error)]
#[error("invalid service endpoint `{url}`")]
pub struct InvalidEndpoint {
    url: String,
    #[source]
    source: Option<url::ParseError>,
}

impl InvalidEndpoint {
    pub(crate) fn new(url: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Self {
            url: url.into(),
            source,
        }
    }
}

/// An error occurring while dispatching a request to a service
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No token could be signed, so the request was not sent
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The service answered with a status of 300 or above
    #[error("service responded with {status}: {body}")]
    Backend {
        /// The response status
        status: StatusCode,
        /// The raw response body
        body: String,
    },

    /// The request could not be delivered or timed out
    #[error("transport failure")]
    Transport(#[source] reqwest::Error),

    /// The caller cancelled the request before it completed
    #[error("request cancelled")]
    Cancelled,

    /// A successful response body did not match the expected shape
    #[error("unable to decode response body")]
    Decode(#[source] serde_json::Error),

    /// The request body could not be encoded
    #[error("unable to encode request body")]
    Encode(#[source] serde_json::Error),

    /// Another middleware refused the request
    #[error(transparent)]
    Middleware(reqwest_middleware::Error),
}

impl DispatchError {
    /// The status of a backend error
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request timed out
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

impl From<reqwest_middleware::Error> for DispatchError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => Self::Transport(err),
            reqwest_middleware::Error::Middleware(err) => match err.downcast::<SigningError>() {
                Ok(err) => Self::Signing(err),
                Err(err) => Self::Middleware(reqwest_middleware::Error::Middleware(err)),
            },
        }
    }
}
