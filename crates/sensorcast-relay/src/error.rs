//! Error types for the relay.

use sensorcast_transport::ConnectionId;

/// Errors that can occur inside the relay.
///
/// None of these is fatal. `RoleConflict` is reported back to the
/// requester, `UnauthorizedAction` is dropped without a reply, and
/// `Unavailable` only happens while the server is shutting down.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A presenter request arrived while another connection holds the
    /// role. The display text is what the requester is shown, so it does
    /// not name the holder.
    #[error("a presenter is already active")]
    RoleConflict { holder: ConnectionId },

    /// A sample or clear signal came from a connection that isn't the
    /// presenter.
    #[error("{connection} does not hold the presenter role")]
    UnauthorizedAction { connection: ConnectionId },

    /// The relay actor has stopped and its command channel is closed.
    #[error("relay is unavailable")]
    Unavailable,
}
