#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_parse};

/// MongoDB connection settings
///
/// ```ignore
/// use database::mongodb::MongoConfig;
///
/// let config = MongoConfig::with_database("mongodb://localhost:27017", "inventory")
///     .with_app_name("inventory-api");
/// ```
#[derive(Clone, Debug)]
pub struct MongoConfig {
    /// Format: mongodb://[username:password@]host[:port][/database][?options]
    pub url: String,
    pub database: String,
    /// Reported to the server and visible in its logs
    pub app_name: Option<String>,
    pub max_pool_size: u32,
    pub connect_timeout_secs: u64,
}

impl MongoConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_database(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Connection URL with any `user:password@` section masked, for logging.
    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                format!("{}://***@{}", &self.url[..scheme_end], &self.url[at + 1..])
            }
            _ => self.url.clone(),
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            database: "inventory".to_string(),
            app_name: None,
            max_pool_size: 10,
            connect_timeout_secs: 10,
        }
    }
}

/// Environment variables:
/// - `MONGODB_URL` or `MONGO_URL` (required)
/// - `MONGODB_DATABASE` or `MONGO_DATABASE` (required)
/// - `MONGODB_APP_NAME` (optional)
/// - `MONGODB_MAX_POOL_SIZE` (optional, default: 10)
/// - `MONGODB_CONNECT_TIMEOUT_SECS` (optional, default: 10)
#[cfg(feature = "config")]
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("MONGODB_URL")
            .or_else(|_| std::env::var("MONGO_URL"))
            .map_err(|_| ConfigError::MissingEnvVar("MONGODB_URL or MONGO_URL".to_string()))?;

        let database = std::env::var("MONGODB_DATABASE")
            .or_else(|_| std::env::var("MONGO_DATABASE"))
            .map_err(|_| {
                ConfigError::MissingEnvVar("MONGODB_DATABASE or MONGO_DATABASE".to_string())
            })?;

        Ok(Self {
            url,
            database,
            app_name: std::env::var("MONGODB_APP_NAME").ok(),
            max_pool_size: env_parse("MONGODB_MAX_POOL_SIZE", 10)?,
            connect_timeout_secs: env_parse("MONGODB_CONNECT_TIMEOUT_SECS", 10)?,
        })
    }
}
