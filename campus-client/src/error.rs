//! Error types for client binaries.

use crate::api_client::ApiClientError;
use crate::config::ConfigError;
use campus_core::CampusError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiClientError),
    #[error(transparent)]
    Campus(#[from] CampusError),
    #[error("Tracing init failed: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
}
