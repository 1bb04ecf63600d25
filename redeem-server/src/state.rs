//! Application state for redeem-server

use sqlx::PgPool;

use crate::codec;
use crate::config::Config;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// JWT secret for admin authentication
    pub jwt_secret: String,
    /// Admin login username
    pub admin_username: String,
    /// Argon2 PHC hash of the admin password
    pub admin_password_hash: String,
    /// Resolved base origin for generated share links
    pub share_origin: String,
}

impl AppState {
    /// Create a new AppState: connect the pool and run migrations
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let fallback = format!("http://localhost:{}", config.http_port);
        let share_origin =
            codec::resolve_share_origin(config.share_link_origin.as_deref(), &fallback);

        Ok(Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            admin_username: config.admin_username.clone(),
            admin_password_hash: config.admin_password_hash.clone(),
            share_origin,
        })
    }
}
