//! The HTTP-shaped result of a token request

use std::collections::BTreeMap;

use chatkit_clock::DurationSecs;
use serde::{Deserialize, Serialize};

use crate::AccessToken;

/// Error code reported when a token could not be signed
pub const TOKEN_SIGNING_FAILURE: &str = "token_provider/token_signing_failure";

/// A response ready to be sent back by a token-provider endpoint
///
/// Always well-formed, even when the token could not be minted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationResponse {
    /// HTTP status code
    pub status: u16,
    /// Extra response headers
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub body: AuthenticationBody,
}

/// The body of an [`AuthenticationResponse`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthenticationBody {
    /// A freshly minted token
    Token(TokenBody),
    /// Why no token was minted
    Error(ErrorBody),
}

/// A bearer token along with its lifetime
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBody {
    /// The signed token
    pub access_token: AccessToken,
    /// Always `bearer`
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: DurationSecs,
}

/// A machine-readable error
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code
    pub error: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Where to find more about the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

impl AuthenticationResponse {
    pub(crate) fn token(access_token: AccessToken, expires_in: DurationSecs) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: AuthenticationBody::Token(TokenBody {
                access_token,
                token_type: "bearer".to_owned(),
                expires_in,
            }),
        }
    }

    pub(crate) fn signing_failure() -> Self {
        Self {
            status: 500,
            headers: BTreeMap::new(),
            body: AuthenticationBody::Error(ErrorBody {
                error: TOKEN_SIGNING_FAILURE.to_owned(),
                error_description: Some("There was an error signing the token".to_owned()),
                error_uri: None,
            }),
        }
    }

    /// Whether a token was minted
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.body, AuthenticationBody::Token(_))
    }

    /// The minted token, if any
    #[must_use]
    pub fn token_body(&self) -> Option<&TokenBody> {
        match &self.body {
            AuthenticationBody::Token(token) => Some(token),
            AuthenticationBody::Error(_) => None,
        }
    }

    /// The error, if no token was minted
    #[must_use]
    pub fn error_body(&self) -> Option<&ErrorBody> {
        match &self.body {
            AuthenticationBody::Token(_) => None,
            AuthenticationBody::Error(error) => Some(error),
        }
    }
}
