pub mod config;
pub mod watch_config;

pub use config::{load_watch_config, load_watch_config_from_env};
pub use watch_config::{WatchConfig, DEFAULT_BLOCK_KEYWORDS, DEFAULT_TAB_LABELS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
