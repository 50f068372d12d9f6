//! HS256 signing of claim sets

use chatkit_jose::{error::JwtVerifyError, jwa, jws, jwt, Jwt, JwtRef};

use crate::{claims::ChatkitClaims, error::SigningError, AccessToken, AccessTokenRef, KeySecretRef};

/// The algorithm every Chatkit token is signed with
pub const ALGORITHM: jwa::Algorithm = jwa::Algorithm::HS256;

/// The HMAC key derived from a key secret
pub fn hmac_key(secret: &KeySecretRef) -> jwa::Hmac {
    jwa::Hmac::new(secret.as_str().as_bytes())
}

/// Signs the claims with the key secret
///
/// # Errors
///
/// Returns an error if the claims cannot be encoded.
pub fn sign(claims: &ChatkitClaims, secret: &KeySecretRef) -> Result<AccessToken, SigningError> {
    sign_with(claims, &hmac_key(secret))
}

/// Signs the claims with an arbitrary signer
///
/// # Errors
///
/// Returns an error if the claims cannot be encoded or the signer fails.
pub fn sign_with<S>(claims: &ChatkitClaims, signer: &S) -> Result<AccessToken, SigningError>
where
    S: jws::Signer,
{
    let jwt = Jwt::try_from_parts_with_signature(&jwt::BasicHeaders::new(ALGORITHM), claims, signer)?;
    Ok(AccessToken::new(jwt.take()))
}

/// Checks the token's signature against the key secret and returns its claims
///
/// Expiration is not checked.
///
/// # Errors
///
/// Returns an error if the token is malformed or was signed with another secret.
pub fn verify(
    token: &AccessTokenRef,
    secret: &KeySecretRef,
) -> Result<ChatkitClaims, JwtVerifyError> {
    let validated: jwt::Validated<ChatkitClaims> =
        JwtRef::from_str(token.as_str()).verify(&hmac_key(secret))?;
    Ok(validated.extract().1)
}
