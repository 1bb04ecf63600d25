//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for admin authentication
    pub jwt_secret: String,
    /// Admin login username
    pub admin_username: String,
    /// Argon2 PHC hash of the admin password
    pub admin_password_hash: String,
    /// Base origin for generated share links (env: SHARE_LINK_ORIGIN)
    pub share_link_origin: Option<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development
    /// environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let admin_password_hash = match std::env::var("ADMIN_PASSWORD_HASH") {
            Ok(v) if !v.is_empty() => v,
            _ => {
                if environment != "development" {
                    return Err(format!(
                        "ADMIN_PASSWORD_HASH must be set in {environment} environment"
                    )
                    .into());
                }
                // Development fallback: hash ADMIN_PASSWORD (default "admin")
                // at startup so local logins work without pre-hashing.
                let plain = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".into());
                crate::util::hash_password(&plain)
                    .map_err(|e| format!("failed to hash dev admin password: {e}"))?
            }
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            admin_password_hash,
            share_link_origin: std::env::var("SHARE_LINK_ORIGIN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            environment,
        })
    }
}
