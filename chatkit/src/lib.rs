//! A server-side SDK for Chatkit instances
//!
//! A [`Client`] is built from an instance locator and key. It signs every
//! request with a bearer token: a cached superuser token for administrative
//! calls, or a short-lived token acting as a user where the service expects
//! one (updating that user, creating a room as its creator, sending a
//! message as its sender).
//!
//! ```no_run
//! use chatkit::{model::CreateUserOptions, Client, Config};
//! use chatkit_tokens::UserId;
//!
//! # async fn run() -> Result<(), chatkit::Error> {
//! let config = Config::new("v1:us1:abc123", "keyid:keysecret")?;
//! let client = Client::new(config)?;
//!
//! let alice = UserId::from_static("alice");
//! client
//!     .core()
//!     .create_user(&CreateUserOptions::new(alice.clone(), "Alice"))
//!     .await?;
//!
//! let user = client.core().get_user(&alice).await?;
//! assert_eq!(user.name, "Alice");
//! # Ok(())
//! # }
//! ```
//!
//! Requests made through a client obtained from
//! [`Client::with_cancellation()`] stop waiting as soon as the given
//! [`CancellationToken`](tokio_util::sync::CancellationToken) fires.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod client;
pub mod config;
mod error;
pub mod model;
pub mod services;

pub use client::Client;
pub use config::Config;
pub use error::Error;
