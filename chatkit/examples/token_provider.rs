use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chatkit::{Client, Config};
use chatkit_tokens::UserId;
use clap::Parser;
use serde::Deserialize;

#[derive(Debug, Parser)]
struct Opts {
    /// The instance locator, as `apiVersion:host:instanceID`
    #[clap(short, long, env = "CHATKIT_INSTANCE_LOCATOR")]
    instance_locator: String,

    /// The instance key, as `keyID:keySecret`
    #[clap(short, long, env = "CHATKIT_KEY", hide_env_values = true)]
    key: String,

    /// Address to listen on
    #[clap(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
}

#[derive(Debug, Deserialize)]
struct AuthParams {
    user_id: UserId,
}

async fn handle_auth(
    State(client): State<Arc<Client>>,
    Query(params): Query<AuthParams>,
) -> Response {
    let response = client.authenticate(&params.user_id);
    tracing::info!(
        user_id = %params.user_id,
        status = response.status,
        "token requested"
    );

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let client = Client::new(Config::new(&opts.instance_locator, &opts.key)?)?;

    let app = Router::new()
        .route("/auth", post(handle_auth))
        .with_state(Arc::new(client));

    let listener = tokio::net::TcpListener::bind(opts.listen).await?;
    tracing::info!(address = %opts.listen, "serving tokens at POST /auth?user_id=<id>");
    println!("Press Ctrl+C to exit");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
