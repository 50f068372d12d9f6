//! Implementations of the JSON Web Token (JWT) standard
//!
//! Only compact JWS serialization is supported. Tokens are assembled from a
//! serializable header and payload, then signed with a [`jws::Signer`].
//!
//! The specifications for this standard can be found in [RFC7519][].
//!
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```
//! use chatkit_jose::{jwa, jwt, Jwt};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug)]
//! struct Claims {
//!     iss: String,
//! }
//!
//! let key = jwa::Hmac::new(b"secret".to_vec());
//! let token = Jwt::try_from_parts_with_signature(
//!     &jwt::BasicHeaders::new(jwa::Algorithm::HS256),
//!     &Claims { iss: "api_keys/key".into() },
//!     &key,
//! )
//! .unwrap();
//!
//! let decomposed: jwt::Decomposed = token.decompose().unwrap();
//! assert_eq!(decomposed.untrusted_header().typ(), Some("JWT"));
//!
//! let validated: jwt::Validated<Claims> = decomposed.verify(&key).unwrap();
//! assert_eq!(validated.claims().iss, "api_keys/key");
//! ```

use std::fmt;

use aliri_braid::braid;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{error, jwa, jws};

/// The media type declared in the `typ` header of every token built here
pub const JWT_TYPE: &str = "JWT";

/// The validated headers and claims of a JWT
///
/// This type can _only_ be generated within this crate to assert that the
/// headers and claims held by this type have already been validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validated<C, H = BasicHeaders> {
    headers: H,
    claims: C,
}

impl<C, H> Validated<C, H> {
    /// Extracts the header and claims from the token
    pub fn extract(self) -> (H, C) {
        (self.headers, self.claims)
    }

    /// The validated token headers
    pub fn headers(&self) -> &H {
        &self.headers
    }

    /// The validated token claims
    pub fn claims(&self) -> &C {
        &self.claims
    }
}

/// A decomposed JWT
///
/// The header has been parsed, but nothing has been checked yet.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Decomposed<'a, H = BasicHeaders> {
    header: H,
    message: &'a str,
    payload: &'a str,
    signature: Vec<u8>,
}

macro_rules! expect_two {
    ($iter:expr) => {{
        let mut i = $iter;
        match (i.next(), i.next(), i.next()) {
            (Some(first), Some(second), None) => Some((first, second)),
            _ => None,
        }
    }};
}

impl<'a, H> Decomposed<'a, H>
where
    H: HasAlgorithm,
{
    /// Verifies the signature of the decomposed JWT and parses its payload
    ///
    /// No claim is inspected beyond being well-formed. Checking expiration
    /// or issuer is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot verify the header's algorithm,
    /// the signature does not match, or the payload cannot be parsed.
    pub fn verify<C, V>(self, key: &V) -> Result<Validated<C, H>, error::JwtVerifyError>
    where
        C: for<'de> Deserialize<'de>,
        V: jws::Verifier,
        error::JwtVerifyError: From<V::Error>,
    {
        let alg = self.header.alg();
        if !key.can_verify(alg) {
            return Err(error::incompatible_algorithm(alg).into());
        }

        key.verify(alg, self.message.as_bytes(), &self.signature)?;

        let p_raw = URL_SAFE_NO_PAD
            .decode(self.payload)
            .map_err(error::malformed_jwt_payload)?;

        let claims: C = serde_json::from_slice(&p_raw).map_err(error::malformed_jwt_payload)?;

        Ok(Validated {
            headers: self.header,
            claims,
        })
    }

    /// The untrusted headers of the JWT
    ///
    /// **WARNING:** *These headers have not been validated and should not be trusted.*
    pub fn untrusted_header(&self) -> &H {
        &self.header
    }

    /// The untrusted, still encoded, payload of the JWT
    pub fn untrusted_payload(&self) -> &'a str {
        self.payload
    }

    /// The encoded header and payload of the JWT, separated by a `.`
    pub fn untrusted_message(&self) -> &'a str {
        self.message
    }

    /// The raw signature of the JWT
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

impl<'a, H> HasAlgorithm for Decomposed<'a, H>
where
    H: HasAlgorithm,
{
    fn alg(&self) -> jwa::Algorithm {
        self.header.alg()
    }
}

impl JwtRef {
    /// Decomposes the JWT into its parts, preparing it for later processing.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWT does not have exactly three sections or
    /// if the header or signature cannot be decoded.
    pub fn decompose<H>(&self) -> Result<Decomposed<H>, error::JwtVerifyError>
    where
        H: for<'de> Deserialize<'de>,
    {
        let (s_str, message) =
            expect_two!(self.as_str().rsplitn(2, '.')).ok_or_else(error::malformed_jwt)?;
        let (payload, h_str) =
            expect_two!(message.rsplitn(2, '.')).ok_or_else(error::malformed_jwt)?;
        if h_str.contains('.') {
            return Err(error::malformed_jwt().into());
        }

        let h_raw = URL_SAFE_NO_PAD
            .decode(h_str)
            .map_err(error::malformed_jwt_header)?;
        let signature = URL_SAFE_NO_PAD
            .decode(s_str)
            .map_err(error::malformed_jwt_signature)?;
        let header: H = serde_json::from_slice(&h_raw).map_err(error::malformed_jwt_header)?;

        Ok(Decomposed {
            header,
            message,
            payload,
            signature,
        })
    }

    /// Verifies a token against a particular key
    ///
    /// If you need to inspect the token first to determine how to verify
    /// the token, use `decompose()` to peek into the JWT.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed or its signature is invalid.
    pub fn verify<C, H, V>(&self, key: &V) -> Result<Validated<C, H>, error::JwtVerifyError>
    where
        C: for<'de> Deserialize<'de>,
        H: for<'de> Deserialize<'de> + HasAlgorithm,
        V: jws::Verifier,
        error::JwtVerifyError: From<V::Error>,
    {
        self.decompose()?.verify(key)
    }
}

/// Indicates that the type specifies the algorithm
pub trait HasAlgorithm {
    /// Algorithm
    ///
    /// The algorithm that was used to sign the token.
    fn alg(&self) -> jwa::Algorithm;
}

/// A JSON Web Token
///
/// This type provides custom implementations of [`Display`][JwtRef#impl-Display] and
/// [`Debug`][JwtRef#impl-Debug] to prevent unintentional disclosures of sensitive values.
#[braid(
    serde,
    debug = "owned",
    display = "owned",
    ord = "omit",
    ref_doc = "\
    A borrowed reference to a JSON Web Token ([`Jwt`])\n\
    \n\
    This type provides custom implementations of [`Display`][Self#impl-Display] and \
    [`Debug`][Self#impl-Debug] to prevent unintentional disclosures of sensitive values.
    "
)]
#[must_use]
pub struct Jwt;

impl Jwt {
    /// Constructs a new JWT from a header and payload, signed by the given signer
    ///
    /// Headers and payload are serialized as JSON blobs, in field declaration
    /// order, then encoded as unpadded base64url.
    ///
    /// # Errors
    ///
    /// * If serialization of either the header or payload fails
    /// * If the signer cannot sign with the algorithm named in the header
    /// * If the signer fails to produce a signature
    pub fn try_from_parts_with_signature<H, P, S>(
        headers: &H,
        payload: &P,
        signer: &S,
    ) -> Result<Self, error::JwtSigningError>
    where
        H: Serialize + HasAlgorithm,
        P: Serialize,
        S: jws::Signer,
    {
        let alg = headers.alg();
        if !signer.can_sign(alg) {
            return Err(error::incompatible_algorithm(alg).into());
        }

        let h_raw = serde_json::to_vec(headers).map_err(error::malformed_jwt_header)?;
        let p_raw = serde_json::to_vec(payload).map_err(error::malformed_jwt_payload)?;

        let mut message = String::new();
        URL_SAFE_NO_PAD.encode_string(&h_raw, &mut message);
        message.push('.');
        URL_SAFE_NO_PAD.encode_string(&p_raw, &mut message);

        let signature = signer
            .sign(alg, message.as_bytes())
            .map_err(error::signer_failure)?;

        message.push('.');
        URL_SAFE_NO_PAD.encode_string(&signature, &mut message);

        Ok(Self::new(message))
    }
}

/// Prints `***JWT***` unless the alternate form is requested
///
/// With `{:#?}`, the header and payload are printed but the signature is
/// omitted. A width, as in `{:#5?}`, reveals that many characters of the
/// signature.
///
/// # Example
///
/// ```
/// # use chatkit_jose::jwt::JwtRef;
/// #
/// let token = JwtRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl");
///
/// assert_eq!(format!("{:?}", token), "***JWT***");
/// assert_eq!(format!("{:#?}", token), "\"eyJhbGciOiJIUzI1NiJ9.e30.…\"");
/// assert_eq!(format!("{:#5?}", token), "\"eyJhbGciOiJIUzI1NiJ9.e30.c2ln…\"");
/// ```
impl fmt::Debug for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str("\"")?;
            write_protected(&self.0, &mut *f, 0)?;
            f.write_str("\"")
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

/// Prints `***JWT***` unless the alternate form is requested
///
/// With `{:#}`, the whole token is printed. A width, as in `{:#10}`, limits
/// how much of the signature is revealed.
///
/// # Example
///
/// ```
/// # use chatkit_jose::jwt::JwtRef;
/// #
/// let token = JwtRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl");
///
/// assert_eq!(format!("{}", token), "***JWT***");
/// assert_eq!(format!("{:#}", token), "eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl");
/// assert_eq!(format!("{:#5}", token), "eyJhbGciOiJIUzI1NiJ9.e30.c2ln…");
/// ```
impl fmt::Display for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write_protected(&self.0, &mut *f, usize::MAX)
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

fn write_protected(token: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    if let Some(last_period) = token.rfind('.') {
        f.write_str(&token[..=last_period])?;
        limited_reveal(&token[last_period + 1..], f, default_len)
    } else {
        limited_reveal(token, f, default_len)
    }
}

fn limited_reveal(unprotected: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    let max_len = f.width().unwrap_or(default_len);
    if max_len <= 1 {
        f.write_str("…")
    } else if max_len > unprotected.len() {
        f.write_str(unprotected)
    } else {
        match unprotected.char_indices().nth(max_len - 2) {
            Some((idx, c)) if idx + c.len_utf8() < unprotected.len() => {
                f.write_str(&unprotected[0..idx + c.len_utf8()])?;
                f.write_str("…")
            }
            _ => f.write_str(unprotected),
        }
    }
}

/// Minimal set of headers for JWTs issued to the platform
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct BasicHeaders {
    alg: jwa::Algorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

impl BasicHeaders {
    /// Constructs JWT headers, to be signed by the specified algorithm
    ///
    /// The `typ` header is always set to `JWT`.
    pub fn new(alg: jwa::Algorithm) -> Self {
        Self {
            alg,
            typ: Some(JWT_TYPE.to_owned()),
        }
    }

    /// The declared media type of the token, if any
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.typ.as_deref()
    }
}

impl HasAlgorithm for BasicHeaders {
    fn alg(&self) -> jwa::Algorithm {
        self.alg
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
    struct Claims {
        instance: String,
        iss: String,
        iat: u64,
    }

    fn claims() -> Claims {
        Claims {
            instance: "instance".into(),
            iss: "api_keys/key".into(),
            iat: 1_000,
        }
    }

    fn signed(secret: &[u8]) -> Result<Jwt> {
        let key = jwa::Hmac::new(secret.to_vec());
        Ok(Jwt::try_from_parts_with_signature(
            &BasicHeaders::new(jwa::Algorithm::HS256),
            &claims(),
            &key,
        )?)
    }

    #[derive(Debug, thiserror::Error)]
    #[error("hardware key unplugged")]
    struct Unplugged;

    struct BrokenSigner;

    impl jws::Signer for BrokenSigner {
        type Error = Unplugged;

        fn can_sign(&self, _alg: jwa::Algorithm) -> bool {
            true
        }

        fn sign(&self, _alg: jwa::Algorithm, _data: &[u8]) -> Result<Vec<u8>, Self::Error> {
            Err(Unplugged)
        }
    }

    struct Hs512Only;

    impl jws::Signer for Hs512Only {
        type Error = std::convert::Infallible;

        fn can_sign(&self, alg: jwa::Algorithm) -> bool {
            alg == jwa::Algorithm::HS512
        }

        fn sign(&self, _alg: jwa::Algorithm, _data: &[u8]) -> Result<Vec<u8>, Self::Error> {
            Ok(vec![0; 64])
        }
    }

    #[test]
    fn header_is_alg_then_typ() -> Result<()> {
        let token = signed(b"secret")?;
        let header = token.as_str().split('.').next().unwrap_or_default();
        let decoded = URL_SAFE_NO_PAD.decode(header)?;
        assert_eq!(decoded, br#"{"alg":"HS256","typ":"JWT"}"#);
        Ok(())
    }

    #[test]
    fn payload_keeps_field_order() -> Result<()> {
        let token = signed(b"secret")?;
        let payload = token.as_str().split('.').nth(1).unwrap_or_default();
        let decoded = URL_SAFE_NO_PAD.decode(payload)?;
        assert_eq!(
            decoded,
            br#"{"instance":"instance","iss":"api_keys/key","iat":1000}"#
        );
        Ok(())
    }

    #[test]
    fn token_has_no_padding() -> Result<()> {
        let token = signed(b"secret")?;
        assert!(!token.as_str().contains('='));
        assert_eq!(token.as_str().split('.').count(), 3);
        Ok(())
    }

    #[test]
    fn signing_is_deterministic() -> Result<()> {
        assert_eq!(signed(b"secret")?, signed(b"secret")?);
        assert_ne!(signed(b"secret")?, signed(b"terces")?);
        Ok(())
    }

    #[test]
    fn round_trips_through_verification() -> Result<()> {
        let token = signed(b"secret")?;
        let key = jwa::Hmac::new(b"secret".to_vec());
        let validated: Validated<Claims> = token.verify(&key)?;
        assert_eq!(validated.claims(), &claims());
        assert_eq!(validated.headers().typ(), Some(JWT_TYPE));
        assert_eq!(validated.headers().alg(), jwa::Algorithm::HS256);
        Ok(())
    }

    #[test]
    fn wrong_secret_is_a_signature_mismatch() -> Result<()> {
        let token = signed(b"secret")?;
        let key = jwa::Hmac::new(b"other".to_vec());
        let err = token.verify::<Claims, BasicHeaders, _>(&key).unwrap_err();
        assert!(err.is_signature_mismatch());
        Ok(())
    }

    #[test]
    fn signer_failure_is_reported() {
        let err = Jwt::try_from_parts_with_signature(
            &BasicHeaders::new(jwa::Algorithm::HS256),
            &claims(),
            &BrokenSigner,
        )
        .unwrap_err();
        assert!(matches!(err, error::JwtSigningError::SignerFailure(_)));
    }

    #[test]
    fn incompatible_signer_is_rejected() {
        let err = Jwt::try_from_parts_with_signature(
            &BasicHeaders::new(jwa::Algorithm::HS256),
            &claims(),
            &Hs512Only,
        )
        .unwrap_err();
        match err {
            error::JwtSigningError::IncompatibleAlgorithm(e) => {
                assert_eq!(e.algorithm(), jwa::Algorithm::HS256)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    mod when_malformed {
        use super::*;

        #[test]
        fn two_sections_are_rejected() {
            let token = JwtRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30");
            let err = token.decompose::<BasicHeaders>().unwrap_err();
            assert!(matches!(err, error::JwtVerifyError::MalformedToken(_)));
        }

        #[test]
        fn four_sections_are_rejected() {
            let token = JwtRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30.e30.c2ln");
            let err = token.decompose::<BasicHeaders>().unwrap_err();
            assert!(matches!(err, error::JwtVerifyError::MalformedToken(_)));
        }

        #[test]
        fn bad_header_json_is_rejected() {
            let token = JwtRef::from_str("bm90IGpzb24.e30.c2ln");
            let err = token.decompose::<BasicHeaders>().unwrap_err();
            assert!(matches!(err, error::JwtVerifyError::MalformedTokenHeader(_)));
        }

        #[test]
        fn bad_signature_encoding_is_rejected() {
            let token = JwtRef::from_str("eyJhbGciOiJIUzI1NiJ9.e30.!!!");
            let err = token.decompose::<BasicHeaders>().unwrap_err();
            assert!(matches!(
                err,
                error::JwtVerifyError::MalformedTokenSignature(_)
            ));
        }
    }

    #[test]
    fn formatting_hides_token() -> Result<()> {
        let token = signed(b"secret")?;
        assert_eq!(format!("{:?}", token), "***JWT***");
        assert_eq!(token.to_string(), "***JWT***");
        assert_eq!(format!("{:#}", token), token.as_str());
        Ok(())
    }
}
