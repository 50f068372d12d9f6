//! Client configuration

use std::time::Duration;

use chatkit_clock::DurationSecs;
use chatkit_tokens::{ConfigurationError, InstanceLocator, Key, DEFAULT_USER_TOKEN_LIFETIME};

/// Environment variable holding the instance locator
pub const INSTANCE_LOCATOR_VAR: &str = "CHATKIT_INSTANCE_LOCATOR";

/// Environment variable holding the instance key
pub const KEY_VAR: &str = "CHATKIT_KEY";

/// Environment variable overriding the request timeout, in whole seconds
pub const TIMEOUT_VAR: &str = "CHATKIT_TIMEOUT_SECS";

/// Request timeout used unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a [`Client`](crate::Client) needs to reach an instance
#[derive(Clone, Debug)]
pub struct Config {
    locator: InstanceLocator,
    key: Key,
    timeout: Duration,
    user_token_lifetime: DurationSecs,
    base_url: Option<String>,
    user_agent: String,
}

impl Config {
    /// Parses the instance locator (`apiVersion:host:instanceID`) and key (`keyID:keySecret`)
    ///
    /// # Errors
    ///
    /// Returns an error if either value is malformed.
    pub fn new(instance_locator: &str, key: &str) -> Result<Self, ConfigurationError> {
        Ok(Self::from_credentials(instance_locator.parse()?, key.parse()?))
    }

    /// A configuration with default settings for already parsed credentials
    pub fn from_credentials(locator: InstanceLocator, key: Key) -> Self {
        Self {
            locator,
            key,
            timeout: DEFAULT_TIMEOUT,
            user_token_lifetime: DEFAULT_USER_TOKEN_LIFETIME,
            base_url: None,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }

    /// Reads `CHATKIT_INSTANCE_LOCATOR`, `CHATKIT_KEY`, and optionally
    /// `CHATKIT_TIMEOUT_SECS` from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value is malformed.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name).ok_or_else(|| ConfigurationError::InvalidSetting {
                name,
                reason: "not set".to_owned(),
            })
        };

        let mut config = Self::new(&required(INSTANCE_LOCATOR_VAR)?, &required(KEY_VAR)?)?;

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigurationError::InvalidSetting {
                    name: TIMEOUT_VAR,
                    reason: e.to_string(),
                })?;
            if secs == 0 {
                return Err(ConfigurationError::InvalidSetting {
                    name: TIMEOUT_VAR,
                    reason: "must be at least one second".to_owned(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Sets the timeout applied to each request
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the lifetime of per-user tokens
    ///
    /// A zero lifetime is raised to one second.
    #[must_use]
    pub fn with_user_token_lifetime(mut self, lifetime: DurationSecs) -> Self {
        self.user_token_lifetime = lifetime.max(DurationSecs(1));
        self
    }

    /// Sends requests under this base URL instead of the instance's cluster
    ///
    /// Useful for private deployments and tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the `User-Agent` sent with every request
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The instance locator
    #[must_use]
    pub fn locator(&self) -> &InstanceLocator {
        &self.locator
    }

    /// The instance key
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The per-request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The lifetime of per-user tokens
    #[must_use]
    pub fn user_token_lifetime(&self) -> DurationSecs {
        self.user_token_lifetime
    }

    /// The base URL override, if any
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// The `User-Agent` header value
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
