//! Parsing of instance locators and keys

use std::{fmt, str::FromStr};

use crate::{error::ConfigurationError, InstanceId, KeyId, KeySecret};

const LOCATOR: &str = "instance locator";
const KEY: &str = "key";

fn split_exact<'a, const N: usize>(
    s: &'a str,
    source_name: &'static str,
    names: [&'static str; N],
    malformed: fn(usize) -> ConfigurationError,
) -> Result<[&'a str; N], ConfigurationError> {
    let components: Vec<&'a str> = s.split(':').collect();
    let components: [&'a str; N] = components
        .try_into()
        .map_err(|c: Vec<&'a str>| malformed(c.len()))?;

    for (component, name) in components.iter().zip(names) {
        if component.is_empty() {
            return Err(ConfigurationError::EmptyComponent {
                component: name,
                source_name,
            });
        }
    }

    Ok(components)
}

/// Where a Chatkit instance lives, as `apiVersion:host:instanceID`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceLocator {
    api_version: String,
    host: String,
    instance_id: InstanceId,
}

impl InstanceLocator {
    /// The API version shared by every service of the instance, e.g. `v1`
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// The cluster the instance lives in, e.g. `us1`
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The instance identifier
    #[must_use]
    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }
}

impl FromStr for InstanceLocator {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [api_version, host, instance_id] = split_exact(
            s,
            LOCATOR,
            ["API version", "host", "instance ID"],
            |found| ConfigurationError::MalformedInstanceLocator { found },
        )?;

        Ok(Self {
            api_version: api_version.to_owned(),
            host: host.to_owned(),
            instance_id: InstanceId::new(instance_id.to_owned())?,
        })
    }
}

impl fmt::Display for InstanceLocator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.api_version, self.host, self.instance_id)
    }
}

/// An instance key, as `keyID:keySecret`
///
/// The secret is never printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key {
    key_id: KeyId,
    key_secret: KeySecret,
}

impl Key {
    /// Constructs a key from its parts
    pub fn new(key_id: KeyId, key_secret: KeySecret) -> Self {
        Self { key_id, key_secret }
    }

    /// The key identifier
    #[must_use]
    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    /// The shared secret
    #[must_use]
    pub fn key_secret(&self) -> &KeySecret {
        &self.key_secret
    }
}

impl FromStr for Key {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [key_id, key_secret] = split_exact(s, KEY, ["key ID", "key secret"], |found| {
            ConfigurationError::MalformedKey { found }
        })?;

        Ok(Self {
            key_id: KeyId::new(key_id.to_owned())?,
            key_secret: KeySecret::new(key_secret.to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    #[test]
    fn parses_locator() -> Result<()> {
        let locator: InstanceLocator = "v1:us1:abc123".parse()?;
        assert_eq!(locator.api_version(), "v1");
        assert_eq!(locator.host(), "us1");
        assert_eq!(locator.instance_id().as_str(), "abc123");
        assert_eq!(locator.to_string(), "v1:us1:abc123");
        Ok(())
    }

    #[test]
    fn parses_key() -> Result<()> {
        let key: Key = "keyid:keysecret".parse()?;
        assert_eq!(key.key_id().as_str(), "keyid");
        assert_eq!(format!("{:#}", key.key_secret()), "keysecret");
        Ok(())
    }

    #[test]
    fn key_debug_hides_secret() -> Result<()> {
        let key: Key = "keyid:keysecret".parse()?;
        let printed = format!("{:?}", key);
        assert!(!printed.contains("keysecret"));
        assert!(printed.contains("***KEY SECRET***"));
        Ok(())
    }

    mod when_malformed {
        use super::*;

        #[test]
        fn locator_without_colons_is_rejected() {
            let err = "badformat".parse::<InstanceLocator>().unwrap_err();
            assert!(matches!(
                err,
                ConfigurationError::MalformedInstanceLocator { found: 1 }
            ));
        }

        #[test]
        fn locator_with_extra_component_is_rejected() {
            let err = "v1:us1:abc:extra".parse::<InstanceLocator>().unwrap_err();
            assert!(matches!(
                err,
                ConfigurationError::MalformedInstanceLocator { found: 4 }
            ));
        }

        #[test]
        fn locator_with_empty_host_is_rejected() {
            let err = "v1::abc".parse::<InstanceLocator>().unwrap_err();
            assert!(matches!(
                err,
                ConfigurationError::EmptyComponent {
                    component: "host",
                    ..
                }
            ));
        }

        #[test]
        fn key_without_secret_is_rejected() {
            let err = "keyid:".parse::<Key>().unwrap_err();
            assert!(matches!(
                err,
                ConfigurationError::EmptyComponent {
                    component: "key secret",
                    source_name: "key"
                }
            ));
        }

        #[test]
        fn key_with_colon_in_secret_is_rejected() {
            let err = "keyid:sec:ret".parse::<Key>().unwrap_err();
            assert!(matches!(err, ConfigurationError::MalformedKey { found: 3 }));
        }

        #[test]
        fn empty_string_is_rejected() {
            let err = "".parse::<Key>().unwrap_err();
            assert!(matches!(err, ConfigurationError::MalformedKey { found: 1 }));
        }
    }
}
