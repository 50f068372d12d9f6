use aliri_braid::braid;
use std::fmt;
use thiserror::Error;

macro_rules! limited_reveal {
    ($ty:ty: $hidden:literal, $default:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if f.alternate() {
                    f.write_str("\"")?;
                    limited_reveal(&self.0, &mut *f, $default)?;
                    f.write_str("\"")
                } else {
                    f.write_str(concat!("***", $hidden, "***"))
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if f.alternate() {
                    limited_reveal(&self.0, &mut *f, usize::MAX)
                } else {
                    f.write_str(concat!("***", $hidden, "***"))
                }
            }
        }
    };
}

macro_rules! non_empty {
    ($($ty:ty: $what:literal),* $(,)?) => {
        $(
            impl aliri_braid::Validator for $ty {
                type Error = EmptyIdentifier;

                fn validate(s: &str) -> Result<(), Self::Error> {
                    if s.is_empty() {
                        Err(EmptyIdentifier { what: $what })
                    } else {
                        Ok(())
                    }
                }
            }
        )*
    };
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

/// An identifier was the empty string
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{what} cannot be empty")]
pub struct EmptyIdentifier {
    what: &'static str,
}

impl EmptyIdentifier {
    /// An empty identifier of the named kind
    #[must_use]
    pub const fn new(what: &'static str) -> Self {
        Self { what }
    }

    /// The kind of identifier that was empty
    #[must_use]
    pub fn what(&self) -> &'static str {
        self.what
    }
}

impl From<std::convert::Infallible> for EmptyIdentifier {
    #[inline(always)]
    fn from(x: std::convert::Infallible) -> Self {
        match x {}
    }
}

/// The identifier of a Chatkit instance
#[braid(serde, validator)]
pub struct InstanceId;

/// The identifier of an instance key, used as the token issuer
#[braid(serde, validator)]
pub struct KeyId;

/// The shared secret of an instance key
#[braid(serde, debug = "owned", display = "owned")]
pub struct KeySecret;

limited_reveal!(KeySecretRef: "KEY SECRET", 5);

/// A user of a Chatkit instance
#[braid(serde, validator)]
pub struct UserId;

non_empty! {
    InstanceId: "instance ID",
    KeyId: "key ID",
    UserId: "user ID",
}

/// A signed bearer token
#[braid(serde, debug = "owned", display = "owned")]
pub struct AccessToken;

limited_reveal!(AccessTokenRef: "ACCESS TOKEN", 15);
