//! HMAC JSON Web Algorithm implementations

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error, jws};

/// HMAC secret
///
/// Any byte string is accepted as a key, including an empty one. Short secrets
/// are insecure, but rejecting them is left to whoever issues the keys.
#[derive(Clone, PartialEq, Eq)]
#[must_use]
pub struct Hmac {
    secret: Vec<u8>,
}

impl fmt::Debug for Hmac {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Hmac { secret }")
    }
}

impl Hmac {
    /// HMAC using the provided secret
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}

/// HMAC signing algorithms
///
/// This list may be expanded in the future.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum SigningAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl SigningAlgorithm {
    /// The size in bytes of an HMAC signature
    #[must_use]
    pub fn signature_size(self) -> usize {
        match self {
            Self::HS256 => 256 / 8,
            Self::HS384 => 384 / 8,
            Self::HS512 => 512 / 8,
        }
    }

    fn into_ring_algorithm(self) -> ring::hmac::Algorithm {
        match self {
            SigningAlgorithm::HS256 => ring::hmac::HMAC_SHA256,
            SigningAlgorithm::HS384 => ring::hmac::HMAC_SHA384,
            SigningAlgorithm::HS512 => ring::hmac::HMAC_SHA512,
        }
    }
}

impl jws::Signer for Hmac {
    type Error = std::convert::Infallible;

    fn can_sign(&self, _alg: SigningAlgorithm) -> bool {
        true
    }

    fn sign(&self, alg: SigningAlgorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let key = ring::hmac::Key::new(alg.into_ring_algorithm(), &self.secret);
        let digest = ring::hmac::sign(&key, data);
        Ok(digest.as_ref().to_owned())
    }
}

impl jws::Verifier for Hmac {
    type Error = error::SignatureMismatch;

    fn can_verify(&self, _alg: SigningAlgorithm) -> bool {
        true
    }

    fn verify(
        &self,
        alg: SigningAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        let key = ring::hmac::Key::new(alg.into_ring_algorithm(), &self.secret);
        ring::hmac::verify(&key, data, signature).map_err(|_| error::signature_mismatch())
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        };

        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jws::{Signer, Verifier};

    // RFC 4231, test case 2
    const KEY: &[u8] = b"Jefe";
    const DATA: &[u8] = b"what do ya want for nothing?";
    const HS256_MAC: &str = "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843";

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn hs256_matches_rfc_4231_vector() {
        let key = Hmac::new(KEY);
        let mac = key.sign(SigningAlgorithm::HS256, DATA).unwrap();
        assert_eq!(hex(&mac), HS256_MAC);
        assert_eq!(mac.len(), SigningAlgorithm::HS256.signature_size());
    }

    #[test]
    fn empty_secret_is_a_usable_key() {
        let key = Hmac::new(Vec::<u8>::new());
        assert!(key.secret().is_empty());
        let mac = key.sign(SigningAlgorithm::HS256, DATA).unwrap();
        key.verify(SigningAlgorithm::HS256, DATA, &mac).unwrap();
    }

    #[test]
    fn verification_fails_with_other_secret() {
        let mac = Hmac::new(KEY).sign(SigningAlgorithm::HS256, DATA).unwrap();
        let err = Hmac::new(b"not jefe".to_vec())
            .verify(SigningAlgorithm::HS256, DATA, &mac)
            .unwrap_err();
        assert_eq!(err, error::signature_mismatch());
    }

    #[test]
    fn debug_hides_secret() {
        assert_eq!(format!("{:?}", Hmac::new(KEY)), "Hmac { secret }");
    }

    #[test]
    fn algorithm_names() {
        assert_eq!(SigningAlgorithm::HS256.to_string(), "HS256");
        assert_eq!(
            serde_json::to_string(&SigningAlgorithm::HS512).unwrap(),
            "\"HS512\""
        );
    }
}
