//! Implementations of the JSON Web Algorithms (JWA) standard
//!
//! Only the symmetric HMAC family is implemented; the platform verifies tokens
//! with the same secret that signed them.
//!
//! The specifications for these algorithms can be found in [RFC7518][].
//!
//! [RFC7518]: https://tools.ietf.org/html/rfc7518

pub mod hmac;

#[doc(inline)]
pub use hmac::Hmac;

/// JSON Web Signature signing algorithms
///
/// This list may be expanded in the future.
pub type Algorithm = hmac::SigningAlgorithm;
