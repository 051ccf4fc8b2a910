use crate::{env_or_default, env_parse, ConfigError, FromEnv};
use std::net::Ipv4Addr;

/// HTTP listener configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma separated CORS allow-list; `None` means permissive CORS.
    pub cors_allowed_origins: Option<String>,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            cors_allowed_origins: None,
        }
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Allowed origins split out of the comma separated list, blanks dropped.
    pub fn allowed_origins(&self) -> Vec<&str> {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl FromEnv for ServerConfig {
    /// - HOST: defaults to 0.0.0.0
    /// - PORT: defaults to 8080
    /// - CORS_ALLOWED_ORIGIN: optional
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_parse("PORT", 8080u16)?;
        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGIN").ok();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Ipv4Addr::UNSPECIFIED.to_string(), 8080)
    }
}
