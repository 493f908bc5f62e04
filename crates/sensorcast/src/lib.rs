//! # Sensorcast
//!
//! Relays one presenter's live motion-sensor readings to any number of
//! viewers over WebSocket.
//!
//! Clients connect, ask for a role with `select_role`, and the relay grants
//! the presenter role to at most one of them at a time. The presenter's
//! `sensor_data` and `clear_chart` events are rebroadcast to everyone else.
//! When the presenter disconnects the role becomes free again.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sensorcast::prelude::*;
//!
//! # async fn run() -> Result<(), SensorcastError> {
//! let server = SensorcastServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::SensorcastError;
pub use server::{SensorcastServer, SensorcastServerBuilder};

pub mod prelude {
    pub use crate::{
        ConfigError, SensorcastError, SensorcastServer, SensorcastServerBuilder, ServerConfig,
    };
    pub use sensorcast_protocol::{
        ClientEvent, Codec, JsonCodec, Recipient, Role, Sample, ServerEvent,
    };
    pub use sensorcast_relay::{PRESENTER_ALREADY_ACTIVE, RelayHandle, RelayInfo};
    pub use sensorcast_transport::ConnectionId;
}
