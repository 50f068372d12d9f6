#![allow(dead_code)]

use chatkit::{Client, Config};
use chatkit_tokens::{claims::ChatkitClaims, signer, AccessToken, KeySecret};
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use wiremock::{MockServer, Request};

pub const LOCATOR: &str = "v1:us1:abc123";
pub const KEY: &str = "keyid:keysecret";
pub const SECRET: &str = "keysecret";

pub const TIMESTAMP: &str = "2017-04-13T14:10:04Z";

pub async fn setup() -> Result<(MockServer, Client)> {
    let server = MockServer::start().await;
    let client = Client::new(Config::new(LOCATOR, KEY)?.with_base_url(server.uri()))?;
    Ok((server, client))
}

/// The path of `rest` under a service of the test instance
pub fn service_path(service: &str, rest: &str) -> String {
    format!("/services/{service}/v1/abc123{rest}")
}

/// Verifies the bearer token of a recorded request and returns its claims
pub fn claims_of(request: &Request) -> Result<ChatkitClaims> {
    let header = request
        .headers
        .get("authorization")
        .ok_or_else(|| eyre!("request carried no authorization header"))?
        .to_str()?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| eyre!("authorization header is not a bearer token"))?;

    Ok(signer::verify(
        &AccessToken::new(token.to_owned()),
        &KeySecret::from_static(SECRET),
    )?)
}

/// The claims of the only request the server received
pub async fn single_request_claims(server: &MockServer) -> Result<ChatkitClaims> {
    let requests = server
        .received_requests()
        .await
        .ok_or_else(|| eyre!("request recording is disabled"))?;
    match requests.as_slice() {
        [request] => claims_of(request),
        other => Err(eyre!("expected one request, got {}", other.len())),
    }
}

pub fn user_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
    })
}

pub fn room_json(id: &str, name: &str, creator: &str) -> Value {
    json!({
        "id": id,
        "created_by_id": creator,
        "name": name,
        "private": false,
        "member_user_ids": [creator],
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
    })
}
