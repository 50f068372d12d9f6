//! Minting and caching of the bearer tokens a Chatkit server presents
//!
//! Every request to a Chatkit instance carries an HS256-signed token whose
//! claims name the instance, the issuing key, and either the superuser or the
//! user the request acts on behalf of. This crate builds those claims, signs
//! them, and keeps a superuser token cached until it expires.
//!
//! The [`Authenticator`] is the entry point. It is constructed once per client
//! from an instance locator and key, and is safe to share between threads.
//!
//! ```
//! use chatkit_clock::DurationSecs;
//! use chatkit_tokens::{Authenticator, InstanceLocator, Key, UserId};
//!
//! let locator: InstanceLocator = "v1:us1:abc123".parse()?;
//! let key: Key = "keyid:keysecret".parse()?;
//!
//! let authenticator = Authenticator::from_credentials(&locator, &key)
//!     .with_user_token_lifetime(DurationSecs::HOUR);
//!
//! // Cached until it expires
//! let su = authenticator.su_token()?;
//! assert_eq!(su, authenticator.su_token()?);
//! assert_eq!(authenticator.regenerations(), 1);
//!
//! // What a token-provider endpoint sends back
//! let response = authenticator.authenticate(&UserId::from_static("bob"));
//! assert_eq!(response.status, 200);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Tokens and secrets never print their values through `Debug` or `Display`
//! unless the alternate flag (`{:#}`) is given.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod authenticator;
mod braids;
pub mod claims;
pub mod credentials;
pub mod error;
mod provider;
pub mod response;
pub mod signer;
mod tokens;

pub use authenticator::{Authenticator, DEFAULT_USER_TOKEN_LIFETIME, SUPERUSER_TOKEN_LIFETIME};
pub use braids::*;
pub use claims::{build_claims, ChatkitClaims, Principal};
pub use credentials::{InstanceLocator, Key};
pub use error::{ConfigurationError, SigningError};
pub use provider::TokenProvider;
pub use response::AuthenticationResponse;
pub use tokens::{TokenStatus, TokenWithLifetime};
