use feedframe_pipeline::ExecutionMode;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Root directory for template and output image bytes.
    pub storage_root: String,
    /// Timeout for outbound feed / product-image fetches in seconds
    /// (default: `30`).
    pub feed_timeout_secs: u64,
    /// How triggered jobs execute (`spawned` or `inline`).
    pub execution_mode: ExecutionMode,
    /// JWT token configuration (secret, expiry duration).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default     |
    /// |------------------------|-------------|
    /// | `HOST`                 | `0.0.0.0`   |
    /// | `PORT`                 | `3000`      |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`        |
    /// | `STORAGE_ROOT`         | `./storage` |
    /// | `FEED_TIMEOUT_SECS`    | `30`        |
    /// | `EXECUTION_MODE`       | `spawned`   |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values and on a missing `JWT_SECRET` --
    /// misconfiguration should fail fast at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let storage_root =
            std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./storage".into());

        let feed_timeout_secs: u64 = std::env::var("FEED_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("FEED_TIMEOUT_SECS must be a valid u64");

        let execution_mode = ExecutionMode::from_name(
            &std::env::var("EXECUTION_MODE").unwrap_or_else(|_| "spawned".into()),
        )
        .expect("EXECUTION_MODE must be 'spawned' or 'inline'");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage_root,
            feed_timeout_secs,
            execution_mode,
            jwt,
        }
    }
}
