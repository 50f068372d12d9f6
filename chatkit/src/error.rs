use chatkit_reqwest::{DispatchError, InvalidEndpoint};
use chatkit_tokens::{ConfigurationError, SigningError};
use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong when talking to a Chatkit instance
#[derive(Debug, Error)]
pub enum Error {
    /// The client could not be configured
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A service URL could not be formed from the configuration
    #[error(transparent)]
    Endpoint(#[from] InvalidEndpoint),

    /// A token could not be signed; nothing was sent
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// An argument was rejected before any request was made
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

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

    /// The request was cancelled before it completed
    #[error("request cancelled")]
    Cancelled,

    /// A request body could not be encoded
    #[error("unable to encode request body")]
    Encode(#[source] serde_json::Error),

    /// A response body did not have the expected shape
    #[error("unable to decode response body")]
    Decode(#[source] serde_json::Error),

    /// A middleware refused the request
    #[error(transparent)]
    Middleware(reqwest_middleware::Error),
}

impl Error {
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

impl From<DispatchError> for Error {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Signing(err) => Self::Signing(err),
            DispatchError::Backend { status, body } => Self::Backend { status, body },
            DispatchError::Transport(err) => Self::Transport(err),
            DispatchError::Cancelled => Self::Cancelled,
            DispatchError::Decode(err) => Self::Decode(err),
            DispatchError::Encode(err) => Self::Encode(err),
            DispatchError::Middleware(err) => Self::Middleware(err),
        }
    }
}
