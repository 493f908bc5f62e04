//! The Sensorcast session relay.
//!
//! One presenter streams motion samples; everyone else watches. This crate
//! decides who the presenter is and fans the presenter's events out to
//! every other connection.
//!
//! # Key types
//!
//! - [`PresenterSlot`]: the `Unheld`/`HeldBy` state machine behind the
//!   single-presenter rule
//! - [`dispatch`]: pure event handlers: slot + event → outbound events
//! - [`Relay`]: slot plus the outbound queues of connected peers
//! - [`RelayHandle`]: talks to the relay actor, the one task that
//!   processes every event in arrival order
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← one task per connection, forwards decoded events
//!     ↕
//! Relay (this crate)  ← role arbitration, broadcast-excluding-sender
//!     ↕
//! Protocol (below)  ← ClientEvent, ServerEvent, Recipient
//! ```

mod actor;
pub mod dispatch;
mod error;
mod relay;
mod slot;

pub use actor::{RelayHandle, spawn_relay};
pub use error::RelayError;
pub use relay::{PeerReceiver, PeerSender, Relay, RelayInfo, peer_channel};
pub use slot::{Claim, PresenterSlot};

/// Reason sent with `role_assign_failure` when the presenter slot is taken.
pub const PRESENTER_ALREADY_ACTIVE: &str = "a presenter is already active";
