use serde::Deserialize;
use std::env;

/// Minimum signing secret length in bytes. HS256 needs a key of at least
/// 256 bits; anything shorter is rejected at startup.
pub const MIN_SECRET_BYTES: usize = 32;

/// Process-wide configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Database location.
    pub database: DatabaseConfig,
    /// Token signing and lifetime settings.
    pub auth: AuthConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

/// Database location.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the local database file. `:memory:` gives an ephemeral
    /// database, used by the test suite.
    pub path: String,
}

/// Token signing and lifetime settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret; at least [`MIN_SECRET_BYTES`] bytes.
    pub jwt_secret: String,
    /// Value of the `iss` claim on issued tokens.
    pub jwt_issuer: String,
    /// Access token lifetime in seconds.
    pub access_token_ttl: i64,
    /// Refresh credential lifetime in seconds.
    pub refresh_token_ttl: i64,
}

impl Config {
    /// Loads configuration from the environment, honoring a `.env` file,
    /// and validates it.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()?,
            },
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH").unwrap_or_else(|_| "gatehouse.db".to_string()),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")?,
                jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "gatehouse".to_string()),
                access_token_ttl: env::var("JWT_ACCESS_EXPIRY")
                    .unwrap_or_else(|_| "900".to_string())
                    .parse()?,
                refresh_token_ttl: env::var("JWT_REFRESH_EXPIRY")
                    .unwrap_or_else(|_| "604800".to_string())
                    .parse()?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Startup-time sanity checks. A weak signing secret is a
    /// configuration error, not something to discover per request.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.auth.jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(format!(
                "JWT_SECRET must be at least {} bytes, got {}",
                MIN_SECRET_BYTES,
                self.auth.jwt_secret.len()
            )
            .into());
        }
        if self.auth.access_token_ttl <= 0 {
            return Err("JWT_ACCESS_EXPIRY must be positive".into());
        }
        if self.auth.refresh_token_ttl <= 0 {
            return Err("JWT_REFRESH_EXPIRY must be positive".into());
        }
        Ok(())
    }
}
