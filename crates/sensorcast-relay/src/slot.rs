//! The presenter slot: who, if anyone, is allowed to stream.
//!
//! ```text
//!            claim(id)                 claim(id)  → AlreadyHeld
//!   Unheld ────────────→ HeldBy(id) ── claim(other) → RoleConflict
//!      ↑                     │
//!      └─── release(id) ─────┘
//! ```
//!
//! There is no terminal state. The slot cycles between `Unheld` and
//! `HeldBy` for as long as the process runs.

use sensorcast_transport::ConnectionId;

use crate::RelayError;

/// Outcome of a successful [`PresenterSlot::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The slot was free and now belongs to the claimant.
    Acquired,
    /// The claimant already held the slot. Nothing changed.
    AlreadyHeld,
}

/// At most one connection holds the presenter role at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenterSlot {
    #[default]
    Unheld,
    HeldBy(ConnectionId),
}

impl PresenterSlot {
    /// Returns the connection holding the slot, if any.
    pub fn holder(&self) -> Option<ConnectionId> {
        match *self {
            Self::Unheld => None,
            Self::HeldBy(id) => Some(id),
        }
    }

    /// Returns `true` if `id` currently holds the slot.
    pub fn is_held_by(&self, id: ConnectionId) -> bool {
        *self == Self::HeldBy(id)
    }

    /// Tries to take the slot for `id`.
    ///
    /// # Errors
    /// [`RelayError::RoleConflict`] if a different connection holds it.
    /// The slot is left untouched in that case.
    pub fn claim(&mut self, id: ConnectionId) -> Result<Claim, RelayError> {
        match *self {
            Self::Unheld => {
                *self = Self::HeldBy(id);
                Ok(Claim::Acquired)
            }
            Self::HeldBy(holder) if holder == id => Ok(Claim::AlreadyHeld),
            Self::HeldBy(holder) => Err(RelayError::RoleConflict { holder }),
        }
    }

    /// Frees the slot if `id` holds it. Returns `true` if it did.
    pub fn release(&mut self, id: ConnectionId) -> bool {
        if self.is_held_by(id) {
            *self = Self::Unheld;
            true
        } else {
            false
        }
    }

    /// Checks that `id` may act as presenter.
    ///
    /// # Errors
    /// [`RelayError::UnauthorizedAction`] if `id` is not the holder,
    /// including when nobody holds the slot.
    pub fn authorize(&self, id: ConnectionId) -> Result<(), RelayError> {
        if self.is_held_by(id) {
            Ok(())
        } else {
            Err(RelayError::UnauthorizedAction { connection: id })
        }
    }
}
