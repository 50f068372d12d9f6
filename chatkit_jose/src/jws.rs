//! Signing and verification primitives of the JSON Web Signature (JWS) standard
//!
//! The specifications for this standard can be found in [RFC7515][].
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515

use std::error::Error as StdError;

use crate::jwa;

/// A JWS signer
pub trait Signer {
    /// The error returned on failure to sign
    type Error: StdError + Send + Sync + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this signer
    fn can_sign(&self, alg: jwa::Algorithm) -> bool;

    /// Attempts to sign the data provided using the specified algorithm
    fn sign(&self, alg: jwa::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

/// A JWS verifier
pub trait Verifier {
    /// The error returned on a failure to verify
    type Error: StdError + Send + Sync + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this verifier
    fn can_verify(&self, alg: jwa::Algorithm) -> bool;

    /// Attempts to verify the data against the signature using the
    /// specified algorithm
    fn verify(&self, alg: jwa::Algorithm, data: &[u8], signature: &[u8])
        -> Result<(), Self::Error>;
}

impl<S: Signer + ?Sized> Signer for &'_ S {
    type Error = S::Error;

    #[inline]
    fn can_sign(&self, alg: jwa::Algorithm) -> bool {
        (**self).can_sign(alg)
    }

    #[inline]
    fn sign(&self, alg: jwa::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        (**self).sign(alg, data)
    }
}

impl<V: Verifier + ?Sized> Verifier for &'_ V {
    type Error = V::Error;

    #[inline]
    fn can_verify(&self, alg: jwa::Algorithm) -> bool {
        (**self).can_verify(alg)
    }

    #[inline]
    fn verify(
        &self,
        alg: jwa::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        (**self).verify(alg, data, signature)
    }
}
