//! Session and configuration errors.

use crate::builder::BuildError;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a session before or while it is being set up.
///
/// Failures once the receive loop is running are logged, not returned; the
/// way the loop ended is reported in [`crate::protocol::SessionEnd`].
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("No DB server found after {tries} tries")]
    DiscoveryTimeout { tries: u32 },

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Protocol state graph is invalid: {0}")]
    Graph(#[from] BuildError),
}

/// Errors raised while loading an [`crate::protocol::ExchangeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A mode string that names neither role.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Unknown mode '{0}', expected 'source' (RX_SERVER) or 'sink' (RX_HELI)")]
pub struct ParseModeError(pub String);
