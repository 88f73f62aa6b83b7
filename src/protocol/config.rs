//! Session configuration.

use crate::protocol::error::{ConfigError, ParseModeError};
use crate::protocol::signal::{SEND_MODE_RECEIVE, SEND_MODE_SEND};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Well-known port of the DB server.
pub const DEFAULT_DB_SERVER_PORT: u16 = 4711;

/// Role this side plays in the data phase. Fixed for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// This side is the data source: it sends its store to the server.
    #[default]
    #[serde(alias = "RX_SERVER")]
    Source,
    /// This side is the data sink: it receives items from the server.
    #[serde(alias = "RX_HELI")]
    Sink,
}

impl Mode {
    /// Local event injected once the handshake reaches `acked`.
    pub fn negotiation_event(self) -> &'static str {
        match self {
            Self::Source => SEND_MODE_SEND,
            Self::Sink => SEND_MODE_RECEIVE,
        }
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" | "rx_server" => Ok(Self::Source),
            "sink" | "rx_heli" => Ok(Self::Sink),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Sink => f.write_str("sink"),
        }
    }
}

/// How the data source pushes its items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushStrategy {
    /// One item per ACK from the server.
    #[default]
    PerAck,
    /// A background task streams the whole store, then finishes the session.
    Bulk,
}

/// Polling policy while waiting for a DB server to show up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub max_tries: u32,
    pub interval_ms: u64,
}

impl DiscoveryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_tries: 10,
            interval_ms: 1000,
        }
    }
}

/// Configuration of one exchange session.
///
/// # Example
///
/// ```rust
/// use heli_exchange::protocol::{ExchangeConfig, Mode, PushStrategy};
///
/// let config = ExchangeConfig::from_json_str(r#"{ "mode": "RX_HELI", "port": 9000 }"#).unwrap();
/// assert_eq!(config.mode, Mode::Sink);
/// assert_eq!(config.port, 9000);
/// assert_eq!(config.push_strategy, PushStrategy::PerAck);
/// assert_eq!(config.read_timeout(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub mode: Mode,
    pub port: u16,
    pub discovery: DiscoveryConfig,
    pub push_strategy: PushStrategy,
    pub bulk_interval_ms: u64,
    /// Give up on a silent peer after this long. `None` waits forever.
    pub read_timeout_ms: Option<u64>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            port: DEFAULT_DB_SERVER_PORT,
            discovery: DiscoveryConfig::default(),
            push_strategy: PushStrategy::default(),
            bulk_interval_ms: 1000,
            read_timeout_ms: None,
        }
    }
}

impl ExchangeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn bulk_interval(&self) -> Duration {
        Duration::from_millis(self.bulk_interval_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}
