//! Sources of bearer tokens for outbound requests

use std::sync::Arc;

use chatkit_clock::Clock;
use chatkit_jose::jws;

use crate::{error::SigningError, AccessToken, Authenticator, Principal};

/// Supplies the bearer token a request should carry
///
/// Implementations must not fall back to an unsigned request: an error
/// means the request is not sent.
pub trait TokenProvider: Send + Sync {
    /// The token for a request made on behalf of `principal`
    ///
    /// # Errors
    ///
    /// Returns an error if no token could be produced.
    fn token_for(&self, principal: &Principal) -> Result<AccessToken, SigningError>;
}

impl<S, C> TokenProvider for Authenticator<S, C>
where
    S: jws::Signer + Send + Sync,
    C: Clock + Send + Sync,
{
    fn token_for(&self, principal: &Principal) -> Result<AccessToken, SigningError> {
        Authenticator::token_for(self, principal)
    }
}

impl<T: TokenProvider + ?Sized> TokenProvider for &'_ T {
    fn token_for(&self, principal: &Principal) -> Result<AccessToken, SigningError> {
        (**self).token_for(principal)
    }
}

impl<T: TokenProvider + ?Sized> TokenProvider for Arc<T> {
    fn token_for(&self, principal: &Principal) -> Result<AccessToken, SigningError> {
        (**self).token_for(principal)
    }
}
