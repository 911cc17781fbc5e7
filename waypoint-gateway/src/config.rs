//! Gateway configuration, read from the environment at start-up.

use std::net::SocketAddr;

/// Environment variable holding the socket address to bind.
pub const LISTEN_ADDR_VAR: &str = "WAYPOINT_LISTEN_ADDR";

/// Environment variable holding the request body limit in bytes.
pub const MAX_BODY_BYTES_VAR: &str = "WAYPOINT_MAX_BODY_BYTES";

const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 8000);

const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// A configuration variable was set to something unusable.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

/// Runtime settings for the HTTP gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct GatewayConfig {
    /// Address the listener binds to.
    pub listen_addr: SocketAddr,

    /// Largest accepted request body; larger bodies are rejected with 413.
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl GatewayConfig {
    /// Read the configuration from process environment variables.
    ///
    /// # Errors
    /// Returns [`ConfigError`] naming the first variable that fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`; unset variables keep their
    /// defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError`] naming the first variable that fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(LISTEN_ADDR_VAR) {
            config.listen_addr = raw.trim().parse().map_err(|e| ConfigError {
                var: LISTEN_ADDR_VAR,
                reason: format!("'{raw}' is not a socket address: {e}"),
            })?;
        }

        if let Some(raw) = lookup(MAX_BODY_BYTES_VAR) {
            let bytes: usize = raw.trim().parse().map_err(|e| ConfigError {
                var: MAX_BODY_BYTES_VAR,
                reason: format!("'{raw}' is not a byte count: {e}"),
            })?;
            if bytes == 0 {
                return Err(ConfigError {
                    var: MAX_BODY_BYTES_VAR,
                    reason: "must be greater than zero".to_owned(),
                });
            }
            config.max_body_bytes = bytes;
        }

        Ok(config)
    }
}
