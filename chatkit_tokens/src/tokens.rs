use chatkit_clock::{Clock, DurationSecs, System, UnixTime};

use crate::{AccessToken, AccessTokenRef, ChatkitClaims};

/// A signed token along with the lifetime it was minted with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenWithLifetime {
    access_token: AccessToken,
    lifetime: DurationSecs,
    issued: UnixTime,
    expiry: UnixTime,
}

/// A token's lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
    /// The token is valid
    Fresh,
    /// The token is no longer valid
    Expired,
}

impl TokenWithLifetime {
    pub(crate) fn new(access_token: AccessToken, claims: &ChatkitClaims) -> Self {
        Self {
            access_token,
            lifetime: claims.lifetime(),
            issued: claims.iat(),
            expiry: claims.exp(),
        }
    }

    /// Gets the access token
    #[inline]
    pub fn access_token(&self) -> &AccessTokenRef {
        &self.access_token
    }

    /// Consumes the value, returning the access token
    #[inline]
    pub fn into_access_token(self) -> AccessToken {
        self.access_token
    }

    /// Gets the token's lifetime
    #[inline]
    pub fn lifetime(&self) -> DurationSecs {
        self.lifetime
    }

    /// Gets the time that the token was issued
    #[inline]
    pub fn issued(&self) -> UnixTime {
        self.issued
    }

    /// Gets the time that the token will expire
    #[inline]
    pub fn expiry(&self) -> UnixTime {
        self.expiry
    }

    /// Gets the interval during which the token is valid
    #[inline]
    pub fn valid_interval(&self) -> std::ops::Range<UnixTime> {
        self.issued..self.expiry
    }

    /// Gets the token's current lifetime status
    #[inline]
    pub fn token_status(&self) -> TokenStatus {
        self.token_status_with_clock(&System)
    }

    /// Gets the token's lifetime status based on the current time
    /// as reported by the provided clock
    #[inline]
    pub fn token_status_with_clock<C: Clock>(&self, clock: &C) -> TokenStatus {
        self.token_status_at(clock.now())
    }

    /// Gets the token's lifetime status as of the provided time
    ///
    /// A token is still fresh at the very second it expires.
    #[inline]
    pub fn token_status_at(&self, time: UnixTime) -> TokenStatus {
        if time > self.expiry {
            TokenStatus::Expired
        } else {
            TokenStatus::Fresh
        }
    }

    /// Gets a duration for how much longer the token would be valid as of the
    /// provided time
    #[inline]
    pub fn until_expired_at(&self, time: UnixTime) -> DurationSecs {
        if time < self.expiry {
            self.expiry - time
        } else {
            DurationSecs(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_claims, InstanceId, KeyId, Principal};

    fn token() -> TokenWithLifetime {
        let claims = build_claims(
            &InstanceId::from_static("abc123"),
            &KeyId::from_static("keyid"),
            UnixTime(100),
            DurationSecs(50),
            &Principal::Superuser,
        );
        TokenWithLifetime::new(AccessToken::from_static("t"), &claims)
    }

    #[test]
    fn tracks_claim_times() {
        let token = token();
        assert_eq!(token.issued(), UnixTime(100));
        assert_eq!(token.expiry(), UnixTime(150));
        assert_eq!(token.lifetime(), DurationSecs(50));
        assert_eq!(token.valid_interval(), UnixTime(100)..UnixTime(150));
    }

    #[test]
    fn expires_strictly_after_expiry() {
        let token = token();
        assert_eq!(token.token_status_at(UnixTime(149)), TokenStatus::Fresh);
        assert_eq!(token.token_status_at(UnixTime(150)), TokenStatus::Fresh);
        assert_eq!(token.token_status_at(UnixTime(151)), TokenStatus::Expired);
    }

    #[test]
    fn counts_down_to_expiry() {
        let token = token();
        assert_eq!(token.until_expired_at(UnixTime(120)), DurationSecs(30));
        assert_eq!(token.until_expired_at(UnixTime(200)), DurationSecs(0));
    }
}
