use chatkit_clock::DurationSecs;
use chatkit_tokens::{signer, Authenticator, InstanceLocator, Key, UserId};
use clap::Parser;

#[derive(Debug, Parser)]
struct Opts {
    /// The instance locator, as `apiVersion:host:instanceID`
    #[clap(short, long, env = "CHATKIT_INSTANCE_LOCATOR")]
    instance_locator: InstanceLocator,

    /// The instance key, as `keyID:keySecret`
    #[clap(short, long, env = "CHATKIT_KEY", hide_env_values = true)]
    key: Key,

    /// Mint a token acting as this user instead of the superuser
    #[clap(short, long)]
    user_id: Option<UserId>,

    /// Lifetime of a user token, in seconds
    #[clap(short, long, default_value_t = 3600)]
    lifetime: u64,
}

fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let authenticator = Authenticator::from_credentials(&opts.instance_locator, &opts.key);

    let token = match &opts.user_id {
        Some(user_id) => authenticator.mint_user_token(user_id, DurationSecs(opts.lifetime))?,
        None => authenticator.su_token()?,
    };

    let claims = signer::verify(&token, opts.key.key_secret())?;
    tracing::info!(
        instance = claims.instance(),
        iss = claims.iss(),
        iat = claims.iat().0,
        exp = claims.exp().0,
        su = claims.su(),
        "minted token"
    );

    println!("{:#}", token);

    Ok(())
}
