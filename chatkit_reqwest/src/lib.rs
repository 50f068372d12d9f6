//! Signed requests to the services of a Chatkit instance
//!
//! Two layers are provided:
//!
//! * [`AccessTokenMiddleware`] attaches a bearer token to every outgoing
//!   request made through a [`ClientWithMiddleware`](reqwest_middleware::ClientWithMiddleware).
//!   The token is chosen by the [`Principal`] stored in the request's
//!   extensions: the cached superuser token, or a freshly minted token acting
//!   as a specific user.
//! * [`Dispatcher`] addresses one backend service, builds requests against it,
//!   and normalizes responses into decoded values or [`DispatchError`]s.
//!
//! A request without a principal is refused rather than sent unsigned. If a
//! request already has an `Authorization` header by the time the middleware
//! executes, the existing value is left in place.
//!
//! ```
//! use std::sync::Arc;
//!
//! use chatkit_reqwest::{AccessTokenMiddleware, Dispatcher, ServiceEndpoint};
//! use chatkit_tokens::{Authenticator, InstanceLocator, Key};
//! use reqwest_middleware::ClientBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let locator: InstanceLocator = "v1:us1:abc123".parse()?;
//! let key: Key = "keyid:keysecret".parse()?;
//! let authenticator = Arc::new(Authenticator::from_credentials(&locator, &key));
//!
//! let client = ClientBuilder::new(reqwest::Client::default())
//!     .with(AccessTokenMiddleware::new(authenticator))
//!     .build();
//!
//! let endpoint = ServiceEndpoint::for_locator(&locator, "chatkit")?;
//! assert_eq!(
//!     endpoint.url().as_str(),
//!     "https://us1.pusherplatform.io/services/chatkit/v1/abc123"
//! );
//!
//! let core = Dispatcher::new(client, endpoint);
//! # let _ = core;
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

use bytes::{BufMut, BytesMut};
use chatkit_tokens::{AccessTokenRef, Principal, TokenProvider};
use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use thiserror::Error;

mod dispatcher;
mod error;

pub use dispatcher::{Dispatcher, ServiceEndpoint, ServiceRequest, PLATFORM_DOMAIN};
pub use error::{DispatchError, InvalidEndpoint};

/// A request reached the token middleware without a [`Principal`] extension
#[derive(Clone, Copy, Debug, Error)]
#[error("request has no principal; refusing to send it unsigned")]
pub struct MissingPrincipal {
    _p: (),
}

/// A token could not be placed into an `Authorization` header
#[derive(Clone, Copy, Debug, Error)]
#[error("access token contains bytes not allowed in a header")]
pub struct InvalidTokenHeader {
    _p: (),
}

/// A middleware that injects an access token into outgoing requests
#[derive(Clone, Debug)]
pub struct AccessTokenMiddleware<T> {
    tokens: T,
}

impl<T> AccessTokenMiddleware<T>
where
    T: TokenProvider,
{
    /// Construct a new middleware from a token provider
    pub fn new(tokens: T) -> Self {
        Self { tokens }
    }

    fn header_value(
        token: &AccessTokenRef,
    ) -> std::result::Result<header::HeaderValue, InvalidTokenHeader> {
        let mut header_value = BytesMut::with_capacity(token.as_str().len() + 7);
        header_value.put_slice(b"Bearer ");
        header_value.put_slice(token.as_str().as_bytes());
        let mut value = header::HeaderValue::from_maybe_shared(header_value)
            .map_err(|_| InvalidTokenHeader { _p: () })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

#[async_trait::async_trait]
impl<T> Middleware for AccessTokenMiddleware<T>
where
    T: TokenProvider + 'static,
{
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if !req.headers().contains_key(header::AUTHORIZATION) {
            let principal = extensions.get::<Principal>().ok_or_else(|| {
                reqwest_middleware::Error::middleware(MissingPrincipal { _p: () })
            })?;

            let token = self
                .tokens
                .token_for(principal)
                .map_err(reqwest_middleware::Error::middleware)?;

            tracing::trace!(principal = principal.kind(), "attaching access token");

            let value =
                Self::header_value(&token).map_err(reqwest_middleware::Error::middleware)?;
            req.headers_mut().insert(header::AUTHORIZATION, value);
        }

        next.run(req, extensions).await
    }
}
