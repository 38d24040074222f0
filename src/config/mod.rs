//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Origins allowed when ALLOWED_ORIGINS is unset (local client dev server)
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Browser origins allowed to open the game socket; "*" allows any
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let allowed_origins = parse_origins(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
        );
        if allowed_origins.is_empty() {
            return Err(ConfigError::NoOrigins);
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            allowed_origins,
        })
    }

    /// Whether a browser origin may open the game socket
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }

    pub fn any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == "*")
    }
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("ALLOWED_ORIGINS must name at least one origin")]
    NoOrigins,
}
