use std::env;

use crate::constants::FRIEND_NOTIFICATION_TTL_SECS;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    /// Redis connection string; the in-process cache is used when unset
    pub redis_url: Option<String>,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    /// Key for the HMAC digests of session tokens
    pub session_secret: String,
    pub bcrypt_cost: u32,
    pub friend_notification_ttl_secs: u64,
    /// Username that is granted administrator rights on registration
    pub admin_username: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/tpu.db".to_string());

        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set for session token hashing")?;

        let bcrypt_cost = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
            .parse()
            .map_err(|_| "Invalid BCRYPT_COST")?;

        let friend_notification_ttl_secs = env::var("FRIEND_NOTIFICATION_TTL_SECS")
            .unwrap_or_else(|_| FRIEND_NOTIFICATION_TTL_SECS.to_string())
            .parse()
            .map_err(|_| "Invalid FRIEND_NOTIFICATION_TTL_SECS")?;

        let admin_username = env::var("ADMIN_USERNAME").ok().filter(|name| !name.is_empty());

        Ok(Config {
            server_host,
            server_port,
            database_path,
            redis_url,
            allowed_origins,
            environment,
            session_secret,
            bcrypt_cost,
            friend_notification_ttl_secs,
            admin_username,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Developer-only routes are enabled in this environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
