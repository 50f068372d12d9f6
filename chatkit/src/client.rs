use std::sync::Arc;

use chatkit_clock::DurationSecs;
use chatkit_reqwest::{AccessTokenMiddleware, Dispatcher, ServiceEndpoint};
use chatkit_tokens::{
    AccessToken, AuthenticationResponse, Authenticator, TokenWithLifetime, UserIdRef,
};
use reqwest::redirect;
use tokio_util::sync::CancellationToken;

use crate::{
    services::{
        AuthorizerService, CoreService, CursorsService, AUTHORIZER_SERVICE, CORE_SERVICE,
        CURSORS_SERVICE,
    },
    Config, Error,
};

/// A connection to one Chatkit instance
///
/// Holds one [`Authenticator`] shared by every service, so the superuser
/// token is minted once and reused until it expires. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct Client {
    authenticator: Arc<Authenticator>,
    core: CoreService,
    authorizer: AuthorizerService,
    cursors: CursorsService,
}

impl Client {
    /// Builds a client from its configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the service
    /// URLs cannot be formed.
    pub fn new(config: Config) -> Result<Self, Error> {
        let authenticator = Arc::new(
            Authenticator::from_credentials(config.locator(), config.key())
                .with_user_token_lifetime(config.user_token_lifetime()),
        );

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(redirect::Policy::none())
            .user_agent(config.user_agent())
            .build()
            .map_err(Error::Transport)?;

        let http = reqwest_middleware::ClientBuilder::new(http)
            .with(AccessTokenMiddleware::new(Arc::clone(&authenticator)))
            .build();

        let dispatcher = |service: &str| -> Result<Dispatcher, Error> {
            let endpoint = endpoint(&config, service)?;
            Ok(Dispatcher::new(http.clone(), endpoint))
        };

        let client = Self {
            core: CoreService::new(dispatcher(CORE_SERVICE)?),
            authorizer: AuthorizerService::new(dispatcher(AUTHORIZER_SERVICE)?),
            cursors: CursorsService::new(dispatcher(CURSORS_SERVICE)?),
            authenticator,
        };

        tracing::debug!(
            instance = %config.locator(),
            base_url = %client.core.dispatcher().endpoint().url(),
            "chatkit client ready"
        );

        Ok(client)
    }

    /// Builds a client configured from the environment
    ///
    /// See [`Config::from_env()`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is missing or malformed, or the
    /// client cannot be built.
    pub fn from_env() -> Result<Self, Error> {
        Self::new(Config::from_env()?)
    }

    /// A client whose requests are abandoned once `token` is cancelled
    ///
    /// Shares the token cache and connection pool with `self`.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            authenticator: Arc::clone(&self.authenticator),
            core: CoreService::new(self.core.dispatcher().with_cancellation(token.clone())),
            authorizer: AuthorizerService::new(
                self.authorizer.dispatcher().with_cancellation(token.clone()),
            ),
            cursors: CursorsService::new(self.cursors.dispatcher().with_cancellation(token)),
        }
    }

    /// Users, rooms, and messages
    #[must_use]
    pub fn core(&self) -> &CoreService {
        &self.core
    }

    /// Roles and permissions
    #[must_use]
    pub fn authorizer(&self) -> &AuthorizerService {
        &self.authorizer
    }

    /// Read cursors
    #[must_use]
    pub fn cursors(&self) -> &CursorsService {
        &self.cursors
    }

    /// The token authority shared by all services
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Mints a user token shaped as a token-provider response
    ///
    /// Suitable for answering client SDKs directly.
    #[must_use]
    pub fn authenticate(&self, user_id: &UserIdRef) -> AuthenticationResponse {
        self.authenticator.authenticate(user_id)
    }

    /// The cached superuser token with its expiry, minted if needed
    ///
    /// # Errors
    ///
    /// Returns an error if a token had to be minted and could not be signed.
    pub fn generate_su_token(&self) -> Result<TokenWithLifetime, Error> {
        Ok(self.authenticator.su_token_with_lifetime()?)
    }

    /// Mints a token acting as `user_id`, valid for `lifetime`
    ///
    /// # Errors
    ///
    /// Returns an error if the token could not be signed.
    pub fn generate_user_token(
        &self,
        user_id: &UserIdRef,
        lifetime: DurationSecs,
    ) -> Result<AccessToken, Error> {
        Ok(self.authenticator.mint_user_token(user_id, lifetime)?)
    }
}

fn endpoint(config: &Config, service: &str) -> Result<ServiceEndpoint, Error> {
    Ok(match config.base_url() {
        Some(base) => ServiceEndpoint::with_base_url(base, config.locator(), service)?,
        None => ServiceEndpoint::for_locator(config.locator(), service)?,
    })
}
