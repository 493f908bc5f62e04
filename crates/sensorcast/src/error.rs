//! Unified error type for Sensorcast.

use sensorcast_protocol::ProtocolError;
use sensorcast_relay::RelayError;
use sensorcast_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum SensorcastError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A relay-level error.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
