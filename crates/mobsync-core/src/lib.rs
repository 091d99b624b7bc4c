pub mod app_config;
pub mod config;
pub mod link;
pub mod offer;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use link::{extract_identifier, validate_link, CanonicalId, LinkError};
pub use offer::{PrincipalImage, UpstreamCavalete, UpstreamItem, UpstreamOffer};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
