//! Shared configuration and record model for the igpull workspace.

pub mod app_config;
pub mod config;
pub mod record;

use thiserror::Error;

pub use app_config::{AppConfig, RetrySettings, StoreConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use record::{DataType, FetchedRecord, Row};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
