//! CLI error types.

use storyloom_gateway::GatewayError;
use thiserror::Error;

/// Failures that end the CLI process.
#[derive(Debug, Error)]
pub enum CliError {
    /// Arguments or environment were insufficient to start.
    #[error("configuration error: {0}")]
    Config(String),

    /// The gateway could not be built.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Terminal I/O failed.
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
}
