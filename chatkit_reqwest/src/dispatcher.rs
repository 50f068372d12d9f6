//! Addressing and dispatch of requests to a single service

use bytes::Bytes;
use chatkit_tokens::{InstanceLocator, Principal};
use reqwest::{header, Method, Url};
use reqwest_middleware::ClientWithMiddleware;
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{DispatchError, InvalidEndpoint};

/// The domain under which instances are hosted, prefixed by the locator's host
pub const PLATFORM_DOMAIN: &str = "pusherplatform.io";

/// The base URL of one service of an instance
///
/// `<base>/services/<service>/<api version>/<instance ID>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceEndpoint {
    service: String,
    url: Url,
}

impl ServiceEndpoint {
    /// The endpoint of `service` on the cluster named by the locator
    ///
    /// # Errors
    ///
    /// Returns an error if the locator's host does not form a valid URL.
    pub fn for_locator(locator: &InstanceLocator, service: &str) -> Result<Self, InvalidEndpoint> {
        let base = format!("https://{}.{}", locator.host(), PLATFORM_DOMAIN);
        Self::with_base_url(&base, locator, service)
    }

    /// The endpoint of `service` under an explicit base URL
    ///
    /// Used for tests and private deployments. The locator's host is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is not a URL that can have a path.
    pub fn with_base_url(
        base: &str,
        locator: &InstanceLocator,
        service: &str,
    ) -> Result<Self, InvalidEndpoint> {
        let mut url = Url::parse(base).map_err(|e| InvalidEndpoint::new(base, Some(e)))?;

        url.path_segments_mut()
            .map_err(|()| InvalidEndpoint::new(base, None))?
            .pop_if_empty()
            .extend([
                "services",
                service,
                locator.api_version(),
                locator.instance_id().as_str(),
            ]);

        Ok(Self {
            service: service.to_owned(),
            url,
        })
    }

    /// The name of the service, e.g. `chatkit_cursors`
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The base URL all request paths are appended to
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn url_for(&self, path: &[String]) -> Url {
        let mut url = self.url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(path);
        }
        url
    }
}

/// A request to a service, relative to its endpoint
///
/// Path segments are percent-encoded individually, so identifiers may
/// contain `/` or spaces.
#[derive(Clone, Debug)]
#[must_use]
pub struct ServiceRequest {
    method: Method,
    path: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    principal: Principal,
}

impl ServiceRequest {
    /// A request acting as `principal`
    pub fn new<I, S>(method: Method, path: I, principal: Principal) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            path: path.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
            principal,
        }
    }

    /// A `GET` request
    pub fn get<I, S>(path: I, principal: Principal) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, path, principal)
    }

    /// A `POST` request
    pub fn post<I, S>(path: I, principal: Principal) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, path, principal)
    }

    /// A `PUT` request
    pub fn put<I, S>(path: I, principal: Principal) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::PUT, path, principal)
    }

    /// A `DELETE` request
    pub fn delete<I, S>(path: I, principal: Principal) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::DELETE, path, principal)
    }

    /// Appends a query parameter; repeated keys are kept
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Appends a query parameter when a value is present
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Sets a JSON body
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, DispatchError> {
        self.body = Some(serde_json::to_vec(body).map_err(DispatchError::Encode)?);
        Ok(self)
    }

    /// The principal the request acts as
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// The HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }
}

/// Sends signed requests to one service of an instance
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    client: ClientWithMiddleware,
    endpoint: ServiceEndpoint,
    cancellation: CancellationToken,
}

impl Dispatcher {
    /// Constructs a dispatcher for the endpoint
    ///
    /// The client is expected to carry an
    /// [`AccessTokenMiddleware`](crate::AccessTokenMiddleware).
    pub fn new(client: ClientWithMiddleware, endpoint: ServiceEndpoint) -> Self {
        Self {
            client,
            endpoint,
            cancellation: CancellationToken::new(),
        }
    }

    /// A dispatcher whose requests are abandoned once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            cancellation: token,
        }
    }

    /// The endpoint requests are sent to
    #[must_use]
    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Sends the request, decoding a non-empty body
    ///
    /// # Errors
    ///
    /// Returns an error if no token could be signed, the request fails or is
    /// cancelled, the service answers with a status of 300 or above, or the
    /// body does not decode as `T`.
    pub async fn send<T>(&self, request: ServiceRequest) -> Result<Option<T>, DispatchError>
    where
        T: DeserializeOwned,
    {
        let body = self.execute(request).await?;
        if body.is_empty() {
            Ok(None)
        } else {
            serde_json::from_slice(&body)
                .map(Some)
                .map_err(DispatchError::Decode)
        }
    }

    /// Sends the request, requiring a body that decodes as `T`
    ///
    /// # Errors
    ///
    /// As [`send()`][Self::send], and also if the body is empty.
    pub async fn send_expecting<T>(&self, request: ServiceRequest) -> Result<T, DispatchError>
    where
        T: DeserializeOwned,
    {
        let body = self.execute(request).await?;
        serde_json::from_slice(&body).map_err(DispatchError::Decode)
    }

    /// Sends the request, discarding any body
    ///
    /// # Errors
    ///
    /// As [`send()`][Self::send], except that the body is never decoded.
    pub async fn send_empty(&self, request: ServiceRequest) -> Result<(), DispatchError> {
        self.execute(request).await.map(drop)
    }

    #[tracing::instrument(
        name = "dispatch",
        skip_all,
        fields(
            service = %self.endpoint.service,
            method = %request.method,
            path = %request.path.join("/"),
            principal = request.principal.kind(),
        )
    )]
    async fn execute(&self, request: ServiceRequest) -> Result<Bytes, DispatchError> {
        let ServiceRequest {
            method,
            path,
            query,
            body,
            principal,
        } = request;

        let mut builder = self
            .client
            .request(method, self.endpoint.url_for(&path))
            .with_extension(principal);

        if !query.is_empty() {
            builder = builder.query(&query);
        }

        if let Some(body) = body {
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, DispatchError>((status, body))
        };

        let (status, body) = tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => {
                tracing::debug!("request cancelled");
                return Err(DispatchError::Cancelled);
            }
            result = exchange => result?,
        };

        if status.as_u16() >= 300 {
            let body = String::from_utf8_lossy(&body).into_owned();
            tracing::warn!(status = status.as_u16(), "service responded with an error");
            return Err(DispatchError::Backend { status, body });
        }

        tracing::debug!(status = status.as_u16(), len = body.len(), "request completed");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chatkit_clock::{TestClock, UnixTime};
    use chatkit_jose::{jwa, jws};
    use chatkit_tokens::{
        signer, AccessTokenRef, Authenticator, ChatkitClaims, InstanceId, Key, KeyId, KeySecret,
        TokenProvider, UserId,
    };
    use color_eyre::Result;
    use reqwest_middleware::ClientBuilder;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::AccessTokenMiddleware;

    fn locator() -> InstanceLocator {
        "v1:us1:abc123".parse().unwrap()
    }

    fn authenticator() -> Arc<Authenticator<jwa::Hmac, TestClock>> {
        let key: Key = "keyid:keysecret".parse().unwrap();
        Arc::new(
            Authenticator::from_credentials(&locator(), &key)
                .with_clock(TestClock::new(UnixTime(1_700_000_000))),
        )
    }

    fn dispatcher_with(
        server: &MockServer,
        client: reqwest::Client,
        tokens: impl TokenProvider + 'static,
    ) -> Dispatcher {
        let client = ClientBuilder::new(client)
            .with(AccessTokenMiddleware::new(tokens))
            .build();
        let endpoint = ServiceEndpoint::with_base_url(&server.uri(), &locator(), "chatkit")
            .expect("mock server uri is a valid base");
        Dispatcher::new(client, endpoint)
    }

    fn dispatcher(server: &MockServer, tokens: impl TokenProvider + 'static) -> Dispatcher {
        dispatcher_with(server, reqwest::Client::new(), tokens)
    }

    async fn bearer_claims(server: &MockServer) -> Result<ChatkitClaims> {
        let requests = server.received_requests().await.unwrap_or_default();
        let request = requests.last().ok_or_else(|| color_eyre::eyre::eyre!("no request"))?;
        let value = request
            .headers
            .get("authorization")
            .ok_or_else(|| color_eyre::eyre::eyre!("no authorization header"))?
            .to_str()?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| color_eyre::eyre::eyre!("not a bearer token"))?;
        Ok(signer::verify(
            AccessTokenRef::from_str(token),
            &KeySecret::from_static("keysecret"),
        )?)
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: String,
        name: String,
    }

    #[test]
    fn endpoint_for_locator_uses_platform_host() {
        let endpoint = ServiceEndpoint::for_locator(&locator(), "chatkit_cursors").unwrap();
        assert_eq!(
            endpoint.url().as_str(),
            "https://us1.pusherplatform.io/services/chatkit_cursors/v1/abc123"
        );
        assert_eq!(endpoint.service(), "chatkit_cursors");
    }

    #[test]
    fn endpoint_with_base_url_keeps_base_path() {
        let endpoint =
            ServiceEndpoint::with_base_url("http://localhost:8080/proxy/", &locator(), "chatkit")
                .unwrap();
        assert_eq!(
            endpoint.url().as_str(),
            "http://localhost:8080/proxy/services/chatkit/v1/abc123"
        );
    }

    #[test]
    fn endpoint_rejects_non_url_base() {
        assert!(ServiceEndpoint::with_base_url("not a url", &locator(), "chatkit").is_err());
        assert!(ServiceEndpoint::with_base_url("mailto:a@b.c", &locator(), "chatkit").is_err());
    }

    #[test]
    fn path_segments_are_escaped() {
        let endpoint = ServiceEndpoint::for_locator(&locator(), "chatkit").unwrap();
        let url = endpoint.url_for(&["users".to_owned(), "a b/c".to_owned()]);
        assert_eq!(url.path(), "/services/chatkit/v1/abc123/users/a%20b%2Fc");
    }

    mod when_principal_is_superuser {
        use super::*;

        #[tokio::test]
        async fn request_carries_su_token_and_decodes_body() -> Result<()> {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/services/chatkit/v1/abc123/users/bob"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"id": "bob", "name": "Bob"})),
                )
                .expect(1)
                .mount(&server)
                .await;

            let auth = authenticator();
            let user: Option<User> = dispatcher(&server, auth.clone())
                .send(ServiceRequest::get(["users", "bob"], Principal::Superuser))
                .await?;

            assert_eq!(
                user,
                Some(User {
                    id: "bob".into(),
                    name: "Bob".into()
                })
            );

            let claims = bearer_claims(&server).await?;
            assert!(claims.su());
            assert!(claims.sub().is_none());
            assert_eq!(auth.regenerations(), 1);
            Ok(())
        }

        #[tokio::test]
        async fn repeated_requests_reuse_cached_token() -> Result<()> {
            let server = MockServer::start().await;
            Mock::given(method("DELETE"))
                .respond_with(ResponseTemplate::new(204))
                .expect(3)
                .mount(&server)
                .await;

            let auth = authenticator();
            let dispatcher = dispatcher(&server, auth.clone());
            for _ in 0..3 {
                dispatcher
                    .send_empty(ServiceRequest::delete(["rooms", "1"], Principal::Superuser))
                    .await?;
            }

            assert_eq!(auth.regenerations(), 1);
            Ok(())
        }
    }

    mod when_principal_is_a_user {
        use super::*;

        #[tokio::test]
        async fn request_carries_fresh_user_token() -> Result<()> {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/services/chatkit/v1/abc123/rooms/1/messages"))
                .and(header("content-type", "application/json"))
                .and(body_json(json!({"text": "hi"})))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message_id": 7})))
                .expect(1)
                .mount(&server)
                .await;

            let auth = authenticator();
            let request = ServiceRequest::post(
                ["rooms", "1", "messages"],
                Principal::User(UserId::from_static("alice")),
            )
            .json(&json!({"text": "hi"}))?;

            let body: serde_json::Value = dispatcher(&server, auth.clone())
                .send_expecting(request)
                .await?;
            assert_eq!(body["message_id"], 7);

            let claims = bearer_claims(&server).await?;
            assert_eq!(claims.sub().map(|u| u.as_str()), Some("alice"));
            assert!(!claims.su());
            assert_eq!(auth.regenerations(), 0);
            Ok(())
        }
    }

    mod when_response_is_successful {
        use super::*;

        #[tokio::test]
        async fn empty_body_yields_nothing() -> Result<()> {
            let server = MockServer::start().await;
            Mock::given(method("PUT"))
                .respond_with(ResponseTemplate::new(204))
                .mount(&server)
                .await;

            let value: Option<User> = dispatcher(&server, authenticator())
                .send(ServiceRequest::put(["users", "bob"], Principal::Superuser))
                .await?;
            assert!(value.is_none());
            Ok(())
        }

        #[tokio::test]
        async fn mismatched_body_is_a_decode_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
                .mount(&server)
                .await;

            let err = dispatcher(&server, authenticator())
                .send::<User>(ServiceRequest::get(["users", "bob"], Principal::Superuser))
                .await
                .unwrap_err();
            assert!(matches!(err, DispatchError::Decode(_)));
        }

        #[tokio::test]
        async fn repeated_query_parameters_are_sent() -> Result<()> {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/services/chatkit/v1/abc123/users_by_ids"))
                .and(query_param("id", "alice"))
                .and(query_param("id", "bob"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
                .expect(1)
                .mount(&server)
                .await;

            let users: Vec<User> = dispatcher(&server, authenticator())
                .send_expecting(
                    ServiceRequest::get(["users_by_ids"], Principal::Superuser)
                        .query("id", "alice")
                        .query("id", "bob")
                        .query_opt::<u32>("limit", None),
                )
                .await?;
            assert!(users.is_empty());
            Ok(())
        }
    }

    mod when_response_is_an_error {
        use super::*;

        #[tokio::test]
        async fn status_and_body_are_surfaced() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(
                    ResponseTemplate::new(404).set_body_string(r#"{"error":"services/chatkit/not_found"}"#),
                )
                .mount(&server)
                .await;

            let err = dispatcher(&server, authenticator())
                .send::<User>(ServiceRequest::get(["users", "nobody"], Principal::Superuser))
                .await
                .unwrap_err();

            assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
            match err {
                DispatchError::Backend { body, .. } => {
                    assert!(body.contains("services/chatkit/not_found"))
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn redirects_count_as_errors() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(304))
                .mount(&server)
                .await;

            let err = dispatcher(&server, authenticator())
                .send_empty(ServiceRequest::get(["rooms"], Principal::Superuser))
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_MODIFIED));
        }
    }

    mod when_signing_fails {
        use super::*;

        #[derive(Debug, thiserror::Error)]
        #[error("key material rejected")]
        struct Rejected;

        #[derive(Debug)]
        struct RejectingSigner;

        impl jws::Signer for RejectingSigner {
            type Error = Rejected;

            fn can_sign(&self, _alg: jwa::Algorithm) -> bool {
                true
            }

            fn sign(&self, _alg: jwa::Algorithm, _data: &[u8]) -> Result<Vec<u8>, Self::Error> {
                Err(Rejected)
            }
        }

        #[tokio::test]
        async fn request_is_never_sent() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;

            let auth = Authenticator::with_signer(
                InstanceId::from_static("abc123"),
                KeyId::from_static("keyid"),
                RejectingSigner,
            );

            let err = dispatcher(&server, auth)
                .send_empty(ServiceRequest::get(["rooms"], Principal::Superuser))
                .await
                .unwrap_err();
            assert!(matches!(err, DispatchError::Signing(_)));
        }
    }

    mod when_caller_gives_up {
        use super::*;

        #[tokio::test]
        async fn cancellation_aborts_in_flight_request() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
                .mount(&server)
                .await;

            let token = CancellationToken::new();
            let dispatcher = dispatcher(&server, authenticator()).with_cancellation(token.clone());

            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                token.cancel();
            });

            let err = dispatcher
                .send_empty(ServiceRequest::get(["rooms"], Principal::Superuser))
                .await
                .unwrap_err();
            assert!(matches!(err, DispatchError::Cancelled));
        }

        #[tokio::test]
        async fn already_cancelled_token_sends_nothing() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;

            let token = CancellationToken::new();
            token.cancel();

            let err = dispatcher(&server, authenticator())
                .with_cancellation(token)
                .send_empty(ServiceRequest::get(["rooms"], Principal::Superuser))
                .await
                .unwrap_err();
            assert!(matches!(err, DispatchError::Cancelled));
        }

        #[tokio::test]
        async fn timeout_is_a_transport_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
                .mount(&server)
                .await;

            let client = reqwest::Client::builder()
                .timeout(Duration::from_millis(100))
                .build()
                .unwrap();

            let err = dispatcher_with(&server, client, authenticator())
                .send_empty(ServiceRequest::get(["rooms"], Principal::Superuser))
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }
    }
}
