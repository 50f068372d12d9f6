//! The claim set carried by every Chatkit token

use chatkit_clock::{DurationSecs, UnixTime};
use serde::{Deserialize, Serialize};

use crate::{InstanceIdRef, KeyIdRef, UserId};

/// The identity a token acts as
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Principal {
    /// Administrative access not attributed to any user
    Superuser,
    /// Access attributed to, and scoped by, a single user
    User(UserId),
}

impl Principal {
    /// Whether this principal is the superuser
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        matches!(self, Self::Superuser)
    }

    /// The user this principal acts as, if any
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Superuser => None,
            Self::User(user_id) => Some(user_id),
        }
    }

    /// A short label suitable for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Superuser => "superuser",
            Self::User(_) => "user",
        }
    }
}

impl From<UserId> for Principal {
    fn from(user_id: UserId) -> Self {
        Self::User(user_id)
    }
}

/// The claims of a Chatkit token, in wire order
///
/// Exactly one of `su` or `sub` is present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatkitClaims {
    instance: String,
    iss: String,
    iat: UnixTime,
    exp: UnixTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    su: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<UserId>,
}

/// Prefix of the `iss` claim, followed by the key ID
pub const ISSUER_PREFIX: &str = "api_keys/";

/// Assembles the claim set for a token issued at `now`
///
/// A zero `duration` is raised to one second, so that `exp` always
/// follows `iat`.
pub fn build_claims(
    instance_id: &InstanceIdRef,
    key_id: &KeyIdRef,
    now: UnixTime,
    duration: DurationSecs,
    principal: &Principal,
) -> ChatkitClaims {
    let duration = if duration.0 == 0 {
        DurationSecs(1)
    } else {
        duration
    };

    let (su, sub) = match principal {
        Principal::Superuser => (Some(true), None),
        Principal::User(user_id) => (None, Some(user_id.clone())),
    };

    ChatkitClaims {
        instance: instance_id.as_str().to_owned(),
        iss: format!("{}{}", ISSUER_PREFIX, key_id),
        iat: now,
        exp: now + duration,
        su,
        sub,
    }
}

impl ChatkitClaims {
    /// The instance the token grants access to
    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// The issuer, `api_keys/<key ID>`
    #[must_use]
    pub fn iss(&self) -> &str {
        &self.iss
    }

    /// When the token was issued
    #[must_use]
    pub fn iat(&self) -> UnixTime {
        self.iat
    }

    /// When the token expires
    #[must_use]
    pub fn exp(&self) -> UnixTime {
        self.exp
    }

    /// Whether the token carries superuser privileges
    #[must_use]
    pub fn su(&self) -> bool {
        self.su.unwrap_or(false)
    }

    /// The user the token acts as, if any
    #[must_use]
    pub fn sub(&self) -> Option<&UserId> {
        self.sub.as_ref()
    }

    /// How long the token is valid for
    #[must_use]
    pub fn lifetime(&self) -> DurationSecs {
        self.exp - self.iat
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use serde_json::json;

    use super::*;

    fn ids() -> (crate::InstanceId, crate::KeyId) {
        (
            crate::InstanceId::from_static("abc123"),
            crate::KeyId::from_static("keyid"),
        )
    }

    #[test]
    fn superuser_claims_have_su_and_no_sub() -> Result<()> {
        let (instance, key) = ids();
        let claims = build_claims(
            &instance,
            &key,
            UnixTime(1_000),
            DurationSecs::HOUR,
            &Principal::Superuser,
        );

        assert_eq!(
            serde_json::to_value(&claims)?,
            json!({
                "instance": "abc123",
                "iss": "api_keys/keyid",
                "iat": 1000,
                "exp": 4600,
                "su": true,
            })
        );
        Ok(())
    }

    #[test]
    fn user_claims_have_sub_and_no_su() -> Result<()> {
        let (instance, key) = ids();
        let claims = build_claims(
            &instance,
            &key,
            UnixTime(1_000),
            DurationSecs(60),
            &Principal::User(UserId::from_static("alice")),
        );

        assert_eq!(
            serde_json::to_value(&claims)?,
            json!({
                "instance": "abc123",
                "iss": "api_keys/keyid",
                "iat": 1000,
                "exp": 1060,
                "sub": "alice",
            })
        );
        assert!(!claims.su());
        Ok(())
    }

    #[test]
    fn serialization_is_byte_identical() -> Result<()> {
        let (instance, key) = ids();
        let build = || {
            build_claims(
                &instance,
                &key,
                UnixTime(42),
                DurationSecs(5),
                &Principal::Superuser,
            )
        };
        assert_eq!(serde_json::to_vec(&build())?, serde_json::to_vec(&build())?);
        assert_eq!(
            serde_json::to_string(&build())?,
            r#"{"instance":"abc123","iss":"api_keys/keyid","iat":42,"exp":47,"su":true}"#
        );
        Ok(())
    }

    #[test]
    fn zero_duration_still_expires_after_issue() {
        let (instance, key) = ids();
        let claims = build_claims(
            &instance,
            &key,
            UnixTime(10),
            DurationSecs(0),
            &Principal::Superuser,
        );
        assert!(claims.exp() > claims.iat());
        assert_eq!(claims.lifetime(), DurationSecs(1));
    }
}
