use std::time::Duration;

use core_config::{
    AppInfo, ConfigError, FromEnv, app_info, env_parse, env_required, server::ServerConfig,
};
use database::mongodb::MongoConfig;
use domain_capture::LabelResolver;
use domain_inventory::{StoreOptions, UpdateStrategy};

pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub store: StoreOptions,
    pub capture: CaptureConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            mongodb,
            server,
            environment,
            store: store_options_from_env()?,
            capture: CaptureConfig::from_env()?,
        })
    }
}

/// Environment variables:
/// - `INVENTORY_UPDATE_STRATEGY` (optional, `compare_and_set` or `last_write_wins`)
/// - `INVENTORY_MAX_WRITE_ATTEMPTS` (optional, default: 5)
fn store_options_from_env() -> Result<StoreOptions, ConfigError> {
    let defaults = StoreOptions::default();
    Ok(StoreOptions {
        strategy: env_parse::<UpdateStrategy>("INVENTORY_UPDATE_STRATEGY", defaults.strategy)?,
        max_attempts: env_parse("INVENTORY_MAX_WRITE_ATTEMPTS", defaults.max_attempts)?,
    })
}

/// Camera, detector and resolver settings
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    pub snapshot_url: String,
    pub camera_timeout: Duration,
    pub detector_url: String,
    pub detector_timeout: Duration,
    /// 0.0 disables the floor
    pub min_confidence: f32,
    /// Load the model at startup instead of on the first capture
    pub preload: bool,
    pub label_max_length: usize,
}

impl FromEnv for CaptureConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let min_confidence: f32 = env_parse("DETECTOR_MIN_CONFIDENCE", 0.0)?;
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(ConfigError::InvalidValue {
                key: "DETECTOR_MIN_CONFIDENCE".to_string(),
                details: format!("{min_confidence} is outside [0, 1]"),
            });
        }

        let label_max_length = env_parse("LABEL_MAX_LENGTH", LabelResolver::DEFAULT_MAX_LENGTH)?;
        if label_max_length == 0 {
            return Err(ConfigError::InvalidValue {
                key: "LABEL_MAX_LENGTH".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            snapshot_url: env_required("CAMERA_SNAPSHOT_URL")?,
            camera_timeout: Duration::from_secs(env_parse("CAMERA_TIMEOUT_SECS", 10)?),
            detector_url: env_required("DETECTOR_URL")?,
            detector_timeout: Duration::from_secs(env_parse("DETECTOR_TIMEOUT_SECS", 30)?),
            min_confidence,
            preload: env_parse("DETECTOR_PRELOAD", false)?,
            label_max_length,
        })
    }
}
