//! Server configuration.
//!
//! Everything has a default, so `ServerConfig::default()` is a working
//! server. [`ServerConfig::from_env`] layers environment overrides on top:
//!
//! | variable | meaning |
//! |---|---|
//! | `SENSORCAST_BIND` | full bind address, e.g. `127.0.0.1:9000` |
//! | `PORT` | port to bind on all interfaces (ignored if `SENSORCAST_BIND` is set) |
//! | `SENSORCAST_OUTBOX_CAPACITY` | per-connection outbound queue depth |

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable was set to something unusable.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Configuration for a Sensorcast server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// How many undelivered events a single connection may have queued.
    /// Past this, new events for that connection are dropped.
    pub outbox_capacity: usize,

    /// Depth of the relay actor's command channel.
    pub relay_channel_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", Self::DEFAULT_PORT),
            outbox_capacity: 256,
            relay_channel_size: 64,
        }
    }
}

impl ServerConfig {
    /// Port used when neither `SENSORCAST_BIND` nor `PORT` is set.
    pub const DEFAULT_PORT: u16 = 3000;

    /// Builds a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset keys keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("SENSORCAST_BIND") {
            if addr.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "SENSORCAST_BIND",
                    value: addr,
                });
            }
            config.bind_addr = addr;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: port.clone(),
            })?;
            config.bind_addr = format!("0.0.0.0:{port}");
        }

        if let Some(raw) = lookup("SENSORCAST_OUTBOX_CAPACITY") {
            config.outbox_capacity = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "SENSORCAST_OUTBOX_CAPACITY",
                        value: raw,
                    });
                }
            };
        }

        Ok(config.validated())
    }

    /// Fixes values that would panic at startup. Channel sizes of 0 are
    /// raised to 1.
    pub fn validated(mut self) -> Self {
        if self.outbox_capacity == 0 {
            tracing::warn!("outbox_capacity is 0, using 1");
            self.outbox_capacity = 1;
        }
        if self.relay_channel_size == 0 {
            tracing::warn!("relay_channel_size is 0, using 1");
            self.relay_channel_size = 1;
        }
        self
    }
}
