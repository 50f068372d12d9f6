//! Errors raised while configuring credentials or minting tokens

use chatkit_jose::error::JwtSigningError;
use thiserror::Error;

use crate::EmptyIdentifier;

/// The credentials given to a client could not be understood
///
/// Raised before any token is minted or any request is made.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The instance locator did not have the `apiVersion:host:instanceID` shape
    #[error(
        "incorrect instance locator format: expected 3 colon-separated components, found {found}"
    )]
    MalformedInstanceLocator {
        /// Number of components found
        found: usize,
    },

    /// The key did not have the `keyID:keySecret` shape
    #[error("incorrect key format: expected 2 colon-separated components, found {found}")]
    MalformedKey {
        /// Number of components found
        found: usize,
    },

    /// A component of the instance locator or key was empty
    #[error("the {component} component of the {source_name} is empty")]
    EmptyComponent {
        /// The component that was empty
        component: &'static str,
        /// Either the instance locator or the key
        source_name: &'static str,
    },

    /// An identifier could not be used
    #[error(transparent)]
    InvalidIdentifier(#[from] EmptyIdentifier),

    /// A setting read from the environment could not be used
    #[error("invalid value for {name}: {reason}")]
    InvalidSetting {
        /// The name of the setting
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// A token could not be signed
///
/// No request should be attempted without the token.
#[derive(Debug, Error)]
#[error("failed to sign token")]
pub struct SigningError {
    #[from]
    source: JwtSigningError,
}
