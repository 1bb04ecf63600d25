//! redeem-server entry point
//!
//! Long-running service that:
//! - Manages packages and their stock inventory (admin API, JWT authenticated)
//! - Issues share links for stock units
//! - Resolves share codes for buyers (public API)

use redeem_server::api;
use redeem_server::config::Config;
use redeem_server::state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redeem_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting redeem-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;
    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("redeem-server listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
