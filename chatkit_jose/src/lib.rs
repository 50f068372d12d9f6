//! The slice of the Javascript/JSON Object Signing and Encryption (JOSE)
//! standards needed to talk to the Chatkit platform:
//!
//! * JSON Web Signature (JWS): [RFC7515][], compact serialization only
//! * JSON Web Algorithms (JWA): [RFC7518][], the HMAC family
//! * JSON Web Token (JWT): [RFC7519][]
//!
//! Tokens are signed with a secret shared between the key holder and the
//! platform, so the same [`Hmac`][jwa::Hmac] key both signs and verifies.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```
//! use chatkit_jose::{jwa, jwt, Jwt};
//!
//! #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
//! struct Claims {
//!     sub: String,
//! }
//!
//! let key = jwa::Hmac::new(b"test".to_vec());
//! let headers = jwt::BasicHeaders::new(jwa::Algorithm::HS256);
//! let claims = Claims { sub: "alice".into() };
//!
//! let token = Jwt::try_from_parts_with_signature(&headers, &claims, &key).unwrap();
//!
//! let validated: jwt::Validated<Claims> = token.verify(&key).expect("JWT was invalid");
//! assert_eq!(validated.claims(), &claims);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
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

pub mod error;
pub mod jwa;
pub mod jws;
pub mod jwt;

#[doc(inline)]
pub use jwt::{Jwt, JwtRef};
