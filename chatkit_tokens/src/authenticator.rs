//! The per-client token authority
//!
//! An [`Authenticator`] holds the instance credentials, keeps one superuser
//! token cached until it expires, and mints per-user tokens on demand.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use chatkit_clock::{Clock, DurationSecs, System};
use chatkit_jose::{jwa, jws};
use parking_lot::Mutex;

use crate::{
    build_claims,
    credentials::{InstanceLocator, Key},
    error::SigningError,
    response::AuthenticationResponse,
    signer, AccessToken, InstanceId, InstanceIdRef, KeyId, KeyIdRef, Principal, TokenStatus,
    TokenWithLifetime, UserIdRef,
};

/// How long a cached superuser token lives
///
/// Independent of the lifetime given to per-user tokens.
pub const SUPERUSER_TOKEN_LIFETIME: DurationSecs = DurationSecs::DAY;

/// Default lifetime of per-user tokens
pub const DEFAULT_USER_TOKEN_LIFETIME: DurationSecs = DurationSecs::DAY;

/// Mints the tokens used to talk to a Chatkit instance
///
/// Cheap to share behind an `Arc`. All callers of [`su_token()`][Self::su_token]
/// are serialized by one lock, so at most one superuser token is minted per
/// expiry cycle no matter how many callers race on a cold cache.
pub struct Authenticator<S = jwa::Hmac, C = System> {
    instance_id: InstanceId,
    key_id: KeyId,
    signer: S,
    clock: C,
    user_token_lifetime: DurationSecs,
    cached: Mutex<Option<TokenWithLifetime>>,
    regenerations: AtomicU64,
}

impl Authenticator {
    /// Constructs an authenticator signing with the key's shared secret
    pub fn new(instance_id: InstanceId, key: &Key) -> Self {
        Self::with_signer(instance_id, key.key_id().clone(), signer::hmac_key(key.key_secret()))
    }

    /// Constructs an authenticator for the instance named by the locator
    pub fn from_credentials(locator: &InstanceLocator, key: &Key) -> Self {
        Self::new(locator.instance_id().clone(), key)
    }
}

impl<S> Authenticator<S> {
    /// Constructs an authenticator using a custom signer
    pub fn with_signer(instance_id: InstanceId, key_id: KeyId, signer: S) -> Self {
        Self {
            instance_id,
            key_id,
            signer,
            clock: System,
            user_token_lifetime: DEFAULT_USER_TOKEN_LIFETIME,
            cached: Mutex::new(None),
            regenerations: AtomicU64::new(0),
        }
    }
}

impl<S, C> Authenticator<S, C> {
    /// Sets a custom clock to be used
    ///
    /// Useful for testing purposes
    pub fn with_clock<D>(self, clock: D) -> Authenticator<S, D> {
        Authenticator {
            instance_id: self.instance_id,
            key_id: self.key_id,
            signer: self.signer,
            clock,
            user_token_lifetime: self.user_token_lifetime,
            cached: self.cached,
            regenerations: self.regenerations,
        }
    }

    /// Sets the lifetime of tokens handed out by [`authenticate()`][Self::authenticate]
    /// and minted for requests made on behalf of a user
    ///
    /// A zero lifetime is raised to one second.
    #[must_use]
    pub fn with_user_token_lifetime(mut self, lifetime: DurationSecs) -> Self {
        self.user_token_lifetime = lifetime.max(DurationSecs(1));
        self
    }

    /// The lifetime of per-user tokens
    pub fn user_token_lifetime(&self) -> DurationSecs {
        self.user_token_lifetime
    }

    /// The instance tokens are minted for
    pub fn instance_id(&self) -> &InstanceIdRef {
        &self.instance_id
    }

    /// The key that signs the tokens
    pub fn key_id(&self) -> &KeyIdRef {
        &self.key_id
    }

    /// How many superuser tokens have been minted so far
    pub fn regenerations(&self) -> u64 {
        self.regenerations.load(Ordering::Relaxed)
    }

    /// A copy of the cached superuser token, if one has been minted
    pub fn cached_token(&self) -> Option<TokenWithLifetime> {
        self.cached.lock().clone()
    }

    /// Drops the cached superuser token, forcing the next call to mint a new one
    pub fn invalidate(&self) {
        if self.cached.lock().take().is_some() {
            tracing::debug!("superuser token invalidated");
        }
    }
}

impl<S, C> Authenticator<S, C>
where
    S: jws::Signer,
    C: Clock,
{
    fn mint(
        &self,
        principal: &Principal,
        lifetime: DurationSecs,
    ) -> Result<TokenWithLifetime, SigningError> {
        let claims = build_claims(
            &self.instance_id,
            &self.key_id,
            self.clock.now(),
            lifetime,
            principal,
        );
        let token = signer::sign_with(&claims, &self.signer)?;
        Ok(TokenWithLifetime::new(token, &claims))
    }

    /// A valid superuser token, minted only when none is cached or the cached one expired
    ///
    /// # Errors
    ///
    /// Returns an error if a new token was needed and could not be signed.
    /// The cache is left untouched in that case.
    pub fn su_token(&self) -> Result<AccessToken, SigningError> {
        self.su_token_with_lifetime()
            .map(TokenWithLifetime::into_access_token)
    }

    /// Like [`su_token()`][Self::su_token], but including the token's issue and expiry times
    ///
    /// # Errors
    ///
    /// Returns an error if a new token was needed and could not be signed.
    pub fn su_token_with_lifetime(&self) -> Result<TokenWithLifetime, SigningError> {
        let mut cached = self.cached.lock();
        let now = self.clock.now();

        if let Some(token) = &*cached {
            if token.token_status_at(now) == TokenStatus::Fresh {
                tracing::trace!(expiry = token.expiry().0, "using cached superuser token");
                return Ok(token.clone());
            }
            tracing::debug!(
                expiry = token.expiry().0,
                now = now.0,
                "superuser token expired"
            );
        }

        let token = self.mint(&Principal::Superuser, SUPERUSER_TOKEN_LIFETIME)?;
        self.regenerations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            issued = token.issued().0,
            expiry = token.expiry().0,
            "regenerated superuser token"
        );

        *cached = Some(token.clone());
        Ok(token)
    }

    /// Mints a token acting as the given user
    ///
    /// Never cached: every call signs a new token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token could not be signed.
    pub fn mint_user_token(
        &self,
        user_id: &UserIdRef,
        lifetime: DurationSecs,
    ) -> Result<AccessToken, SigningError> {
        let token = self.mint(&Principal::User(user_id.to_owned()), lifetime)?;
        tracing::trace!(
            user_id = %user_id,
            expiry = token.expiry().0,
            "minted user token"
        );
        Ok(token.into_access_token())
    }

    /// The token a request on behalf of `principal` should carry
    ///
    /// # Errors
    ///
    /// Returns an error if the token could not be signed.
    pub fn token_for(&self, principal: &Principal) -> Result<AccessToken, SigningError> {
        match principal {
            Principal::Superuser => self.su_token(),
            Principal::User(user_id) => self.mint_user_token(user_id, self.user_token_lifetime),
        }
    }

    /// Mints a user token shaped as a token-provider response
    ///
    /// Never fails: a signing failure becomes a `500` response.
    pub fn authenticate(&self, user_id: &UserIdRef) -> AuthenticationResponse {
        let principal = Principal::User(user_id.to_owned());
        match self.mint(&principal, self.user_token_lifetime) {
            Ok(token) => {
                let expires_in = token.lifetime();
                AuthenticationResponse::token(token.into_access_token(), expires_in)
            }
            Err(error) => {
                tracing::error!(
                    user_id = %user_id,
                    error = (&error as &dyn std::error::Error),
                    "unable to sign user token"
                );
                AuthenticationResponse::signing_failure()
            }
        }
    }
}

impl<S, C> fmt::Debug for Authenticator<S, C>
where
    S: fmt::Debug,
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("instance_id", &self.instance_id)
            .field("key_id", &self.key_id)
            .field("signer", &self.signer)
            .field("clock", &self.clock)
            .field("user_token_lifetime", &self.user_token_lifetime)
            .field(
                "cached_expiry",
                &self.cached.lock().as_ref().map(TokenWithLifetime::expiry),
            )
            .field("regenerations", &self.regenerations())
            .finish()
    }
}
