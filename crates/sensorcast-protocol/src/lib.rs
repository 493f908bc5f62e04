//! Wire protocol for Sensorcast.
//!
//! Every message on the wire is a named event with an optional structured
//! payload:
//!
//! ```text
//! { "event": "sensor_data", "data": { "x": 0.1, "y": 9.8, "z": 0.3 } }
//! { "event": "clear_chart" }
//! ```
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`Role`], [`Sample`],
//!   [`Recipient`]): what travels on the wire and where it is addressed.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Relay (roles, broadcast)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientEvent, Recipient, Role, Sample, ServerEvent};
